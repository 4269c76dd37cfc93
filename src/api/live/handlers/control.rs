use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::core::metrics::LIVE_CLASS_TRANSITIONS;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::{LiveClassStatus, NotificationPriority, NotificationType};
use crate::repositories;
use crate::repositories::notifications::NotificationContent;
use crate::schemas::live::{LiveTransitionResponse, RecordingRequest, RecordingResponse};
use crate::schemas::MessageResponse;

use super::super::helpers;

pub(in crate::api::live) async fn start_class(
    Path(class_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<LiveTransitionResponse>, ApiError> {
    let class = repositories::live_classes::set_status(
        state.db(),
        &class_id,
        LiveClassStatus::Live,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to start live class"))?
    .ok_or_else(|| ApiError::not_found(helpers::CLASS_NOT_FOUND))?;

    metrics::counter!(LIVE_CLASS_TRANSITIONS).increment(1);
    tracing::info!(class_id = %class.id, admin_id = %admin.id, "Live class started manually");

    Ok(Json(LiveTransitionResponse {
        message: "Live class started successfully".to_string(),
        class_id: class.id,
        status: class.status,
    }))
}

pub(in crate::api::live) async fn end_class(
    Path(class_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<LiveTransitionResponse>, ApiError> {
    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let class =
        repositories::live_classes::set_status(&mut *tx, &class_id, LiveClassStatus::Completed, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to end live class"))?
            .ok_or_else(|| ApiError::not_found(helpers::CLASS_NOT_FOUND))?;

    let closed = repositories::live_classes::close_open_attendance(&mut *tx, &class.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close attendance"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit live class end"))?;

    metrics::counter!(LIVE_CLASS_TRANSITIONS).increment(1);
    tracing::info!(
        class_id = %class.id,
        admin_id = %admin.id,
        closed_attendances = closed,
        "Live class ended"
    );

    Ok(Json(LiveTransitionResponse {
        message: "Live class ended successfully".to_string(),
        class_id: class.id,
        status: class.status,
    }))
}

pub(in crate::api::live) async fn stop_and_delete(
    Path(class_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::live_classes::delete(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete live class"))?;
    if !deleted {
        return Err(ApiError::not_found(helpers::CLASS_NOT_FOUND));
    }

    tracing::info!(class_id = %class_id, admin_id = %admin.id, "Live class deleted");
    Ok(Json(MessageResponse::new("Live class stopped and deleted successfully.")))
}

pub(in crate::api::live) async fn save_recording(
    Path(class_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<RecordingRequest>,
) -> Result<Json<RecordingResponse>, ApiError> {
    let url = payload
        .recording_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request("Recording URL is required"))?;

    let class =
        repositories::live_classes::set_recording(state.db(), &class_id, url, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save recording"))?
            .ok_or_else(|| ApiError::not_found(helpers::CLASS_NOT_FOUND))?;

    Ok(Json(RecordingResponse {
        id: class.id,
        title: class.title,
        recording_url: url.to_string(),
    }))
}

pub(in crate::api::live) async fn get_recording(
    Path(class_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<RecordingResponse>, ApiError> {
    let class = helpers::fetch_class(&state, &class_id).await?;
    require_enrollment(&state, &user, &class.course_id, "You are not enrolled in this course")
        .await?;

    let recording_url = class
        .recording_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::not_found("Recording not available for this class"))?;

    Ok(Json(RecordingResponse { id: class.id, title: class.title, recording_url }))
}

pub(in crate::api::live) async fn send_reminder(
    Path(class_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let class = helpers::fetch_class(&state, &class_id).await?;
    let students = repositories::enrollments::active_student_ids(state.db(), &class.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrolled students"))?;

    let ids: Vec<String> = students.iter().map(|_| Uuid::new_v4().to_string()).collect();
    let title = format!("Reminder: {}", class.title);
    let message = format!(
        "Your live class \"{}\" starts at {}.",
        class.title,
        format_primitive(class.scheduled_start)
    );
    let action_url = format!("/live-classes/{}", class.id);

    let sent = repositories::notifications::create_many(
        state.db(),
        &ids,
        &students,
        NotificationContent {
            title: &title,
            message: &message,
            notification_type: NotificationType::LiveClass,
            priority: NotificationPriority::High,
            course_id: Some(&class.course_id),
            action_url: Some(&action_url),
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to send reminders"))?;

    tracing::info!(class_id = %class.id, recipients = sent, "Live class reminder sent");
    Ok(Json(MessageResponse::new(format!("Reminder sent to {sent} students"))))
}
