use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::api::validation::{required, validate_video_upload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::RecordedVideoResponse;
use crate::services::storage::video_key;

struct VideoFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

pub(in crate::api::courses) async fn upload_video(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RecordedVideoResponse>), ApiError> {
    let storage = state.storage().ok_or_else(|| {
        ApiError::ServiceUnavailable("Video storage is not configured".to_string())
    })?;

    let max_mb = state.settings().storage().max_video_size_mb;
    let max_bytes = max_mb * 1024 * 1024;

    let mut course_id: Option<String> = None;
    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut video: Option<VideoFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "video" => {
                let filename = field.file_name().unwrap_or("video.mp4").to_string();
                let content_type =
                    field.content_type().unwrap_or("application/octet-stream").to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read file"))?
                {
                    if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                        return Err(ApiError::BadRequest(format!(
                            "File size exceeds {max_mb}MB limit"
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                video = Some(VideoFile { filename, content_type, bytes });
            }
            "course" | "title" | "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Invalid {name} field")))?;
                match name.as_str() {
                    "course" => course_id = Some(text),
                    "title" => title = Some(text),
                    _ => description = text,
                }
            }
            _ => {}
        }
    }

    let course_id = required(course_id.as_deref(), "course is required")?.to_string();
    let title = required(title.as_deref(), "title is required")?.to_string();
    let video = video.ok_or_else(|| ApiError::bad_request("video file is required"))?;
    if video.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    validate_video_upload(&video.filename, &video.content_type)?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let video_id = Uuid::new_v4().to_string();
    let key = video_key(&course.id, &video_id, &video.filename);
    let (size_bytes, _sha256) = storage
        .upload_bytes(&key, &video.content_type, video.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload video"))?;

    let record = repositories::recorded_videos::create(
        state.db(),
        repositories::recorded_videos::CreateRecordedVideo {
            id: &video_id,
            course_id: &course.id,
            title: &title,
            description: description.trim(),
            storage_key: &key,
            content_type: &video.content_type,
            size_bytes,
            uploaded_by: &admin.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save video"))?;

    tracing::info!(video_id = %record.id, course_id = %course.id, size_bytes, "Recorded video uploaded");
    Ok((StatusCode::CREATED, Json(RecordedVideoResponse::from_db(record, None))))
}

pub(in crate::api::courses) async fn list_videos(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecordedVideoResponse>>, ApiError> {
    require_enrollment(&state, &user, &course_id, "You are not enrolled in this course.").await?;

    let videos = repositories::recorded_videos::list_for_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    let expires =
        std::time::Duration::from_secs(state.settings().storage().presigned_url_expire_minutes * 60);

    let mut items = Vec::with_capacity(videos.len());
    for video in videos {
        let url = match state.storage() {
            Some(storage) => Some(
                storage
                    .presign_get(&video.storage_key, expires)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to sign video URL"))?,
            ),
            None => None,
        };
        items.push(RecordedVideoResponse::from_db(video, url));
    }

    Ok(Json(items))
}
