use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::CertificateType;
use crate::repositories;
use crate::schemas::certificate::{CertificateResponse, ExistingCertificateResponse};

use super::super::helpers::{self, Achievement, Issued};

pub(in crate::api::certificates) async fn generate_course(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let progress = repositories::progress::find_course(state.db(), &user.id, &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course progress"))?
        .ok_or_else(|| ApiError::not_found("Course progress not found"))?;
    if !progress.is_completed {
        return Err(ApiError::bad_request("Course not completed yet"));
    }

    let achievement = Achievement {
        certificate_type: CertificateType::Course,
        target_id: &course.id,
        name: &course.title,
        completed_at: progress.completed_at,
    };
    respond(&state, &user, achievement).await
}

pub(in crate::api::certificates) async fn generate_bundle(
    Path(bundle_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let bundle = repositories::bundles::find_for_student(state.db(), &bundle_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bundle"))?
        .ok_or_else(|| ApiError::not_found("Bundle not found"))?;

    let progress = repositories::progress::find_bundle(state.db(), &user.id, &bundle.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bundle progress"))?
        .ok_or_else(|| ApiError::not_found("Bundle progress not found"))?;
    if !progress.is_completed {
        return Err(ApiError::bad_request("Bundle not completed yet"));
    }

    let achievement = Achievement {
        certificate_type: CertificateType::Bundle,
        target_id: &bundle.id,
        name: &bundle.name,
        completed_at: progress.completed_at,
    };
    respond(&state, &user, achievement).await
}

async fn respond(
    state: &AppState,
    user: &User,
    achievement: Achievement<'_>,
) -> Result<Response, ApiError> {
    match helpers::issue(state, user, achievement).await? {
        Issued::Existing(certificate_id) => Ok((
            StatusCode::OK,
            Json(ExistingCertificateResponse {
                message: "Certificate already exists",
                certificate_id,
            }),
        )
            .into_response()),
        Issued::Created(certificate) => {
            Ok((StatusCode::CREATED, Json(CertificateResponse::from_db(certificate))).into_response())
        }
    }
}
