use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{CourseNote, User};
use crate::repositories;
use crate::schemas::assessment::{NoteCreate, NoteListQuery, NoteResponse, NoteUpdate};

const NOTE_NOT_FOUND: &str = "Note not found";
const DUPLICATE_TITLE: &str = "A note with this title already exists for this course";

/// Decodes a base64 PDF, tolerating a `data:` URL prefix.
fn decode_pdf(encoded: &str, max_mb: u64) -> Result<Vec<u8>, ApiError> {
    let payload = match encoded.trim().split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded.trim(),
    };

    let bytes =
        STANDARD.decode(payload).map_err(|_| ApiError::bad_request("Invalid base64 encoding"))?;
    if bytes.len() as u64 > max_mb * 1024 * 1024 {
        return Err(ApiError::BadRequest(format!("File size cannot exceed {max_mb}MB")));
    }
    Ok(bytes)
}

fn ensure_can_modify(user: &User, note: &CourseNote) -> Result<(), ApiError> {
    if user.is_admin() || note.uploaded_by == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You do not have permission to modify this note"))
    }
}

async fn fetch_note(state: &AppState, note_id: &str) -> Result<CourseNote, ApiError> {
    repositories::notes::find_by_id(state.db(), note_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch note"))?
        .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))
}

async fn list(
    state: &AppState,
    course_id: Option<&str>,
    search: Option<&str>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = repositories::notes::list_active(state.db(), course_id, search)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list notes"))?;
    Ok(Json(notes.into_iter().map(NoteResponse::from_db).collect()))
}

pub(in crate::api::assessments) async fn list_notes(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<NoteListQuery>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let course_id = params.course_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    list(&state, course_id, params.search.as_deref()).await
}

pub(in crate::api::assessments) async fn notes_by_course(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<NoteListQuery>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let course_id = params
        .course_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("course_id parameter is required"))?;

    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    list(&state, Some(course_id), None).await
}

pub(in crate::api::assessments) async fn course_notes(
    Path(course_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    list(&state, Some(&course_id), None).await
}

pub(in crate::api::assessments) async fn create_note(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NoteCreate>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let pdf = decode_pdf(&payload.pdf_base64, state.settings().storage().max_note_size_mb)?;

    let course = repositories::courses::find_by_id(state.db(), payload.course_id.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::bad_request("Course not found"))?;

    let note = repositories::notes::create(
        state.db(),
        repositories::notes::CreateNote {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            title: payload.title.trim(),
            description: payload.description.trim(),
            pdf_data: &pdf,
            uploaded_by: &admin.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict(DUPLICATE_TITLE.to_string())
        } else {
            ApiError::internal(e, "Failed to create note")
        }
    })?;

    tracing::info!(note_id = %note.id, course_id = %course.id, size = note.file_size, "Course note uploaded");
    Ok((StatusCode::CREATED, Json(NoteResponse::from_db(note))))
}

pub(in crate::api::assessments) async fn get_note(
    Path(note_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = fetch_note(&state, &note_id).await?;
    Ok(Json(NoteResponse::from_db(note)))
}

pub(in crate::api::assessments) async fn update_note(
    Path(note_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<NoteUpdate>,
) -> Result<Json<NoteResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let note = fetch_note(&state, &note_id).await?;
    ensure_can_modify(&user, &note)?;

    let pdf_data = match payload.pdf_base64.as_deref().filter(|value| !value.trim().is_empty()) {
        Some(encoded) => Some(decode_pdf(encoded, state.settings().storage().max_note_size_mb)?),
        None => None,
    };

    let updated = repositories::notes::update(
        state.db(),
        &note.id,
        repositories::notes::UpdateNote {
            title: payload.title.map(|value| value.trim().to_string()),
            description: payload.description,
            is_active: payload.is_active,
            pdf_data,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict(DUPLICATE_TITLE.to_string())
        } else {
            ApiError::internal(e, "Failed to update note")
        }
    })?
    .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;

    Ok(Json(NoteResponse::from_db(updated)))
}

pub(in crate::api::assessments) async fn delete_note(
    Path(note_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let note = fetch_note(&state, &note_id).await?;
    ensure_can_modify(&user, &note)?;

    repositories::notes::delete(state.db(), &note.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete note"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::assessments) async fn download_note(
    Path(note_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let download = repositories::notes::download(state.db(), &note_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load note"))?
        .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;

    let filename = download.title.replace(['"', '\r', '\n'], "");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}.pdf\""))
        .body(Body::from(download.pdf_data))
        .map_err(|e| ApiError::internal(e, "Failed to build download response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pdf_accepts_data_urls() {
        let encoded = STANDARD.encode(b"%PDF-1.4");
        assert_eq!(decode_pdf(&encoded, 10).unwrap(), b"%PDF-1.4");
        assert_eq!(
            decode_pdf(&format!("data:application/pdf;base64,{encoded}"), 10).unwrap(),
            b"%PDF-1.4"
        );
    }

    #[test]
    fn decode_pdf_rejects_bad_input() {
        assert!(matches!(
            decode_pdf("not base64!!", 10),
            Err(ApiError::BadRequest(message)) if message == "Invalid base64 encoding"
        ));
        let big = STANDARD.encode(vec![0u8; 1024 * 1024 + 1]);
        assert!(matches!(
            decode_pdf(&big, 1),
            Err(ApiError::BadRequest(message)) if message == "File size cannot exceed 1MB"
        ));
    }
}
