use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::notifications::{NewNotification, UpdateNotification};
use crate::schemas::notification::{
    NotificationCreate, NotificationListQuery, NotificationResponse, NotificationUpdate,
    UnreadCountResponse,
};
use crate::schemas::MessageResponse;

use super::super::helpers;

pub(in crate::api::notifications) async fn list_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationListQuery>,
) -> Result<Json<PaginatedResponse<NotificationResponse>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);
    let recipient = (!user.is_admin()).then_some(user.id.as_str());

    let total_count = repositories::notifications::count(state.db(), recipient)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;
    let rows = repositories::notifications::list(state.db(), recipient, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(NotificationResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

pub(in crate::api::notifications) async fn create_notification(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NotificationCreate>,
) -> Result<(StatusCode, Json<NotificationResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    repositories::users::find_by_id(state.db(), &payload.recipient)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch recipient"))?
        .ok_or_else(|| ApiError::not_found("Recipient not found"))?;

    let notification = repositories::notifications::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        NewNotification {
            recipient_id: &payload.recipient,
            title: payload.title.trim(),
            message: &payload.message,
            notification_type: payload.notification_type,
            priority: payload.priority,
            course_id: payload.course_id.as_deref(),
            action_url: payload.action_url.as_deref(),
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| {
        if crate::db::is_foreign_key_violation(&e) {
            ApiError::bad_request("Course not found")
        } else {
            ApiError::internal(e, "Failed to create notification")
        }
    })?;

    tracing::info!(
        notification_id = %notification.id,
        recipient_id = %notification.recipient_id,
        admin_id = %admin.id,
        "Notification created"
    );
    Ok((StatusCode::CREATED, Json(NotificationResponse::from_db(notification))))
}

pub(in crate::api::notifications) async fn get_notification(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification = helpers::fetch_visible(&state, &user, &notification_id).await?;
    Ok(Json(NotificationResponse::from_db(notification)))
}

pub(in crate::api::notifications) async fn update_notification(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<NotificationUpdate>,
) -> Result<Json<NotificationResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let notification = helpers::fetch_visible(&state, &user, &notification_id).await?;

    let edits_content = payload.title.is_some()
        || payload.message.is_some()
        || payload.priority.is_some()
        || payload.action_url.is_some();
    if edits_content && !user.is_admin() {
        return Err(ApiError::Forbidden("Only admin users can edit notification content"));
    }

    let updated = repositories::notifications::update(
        state.db(),
        &notification.id,
        UpdateNotification {
            title: payload.title.map(|title| title.trim().to_string()),
            message: payload.message,
            priority: payload.priority,
            is_read: payload.is_read,
            action_url: payload.action_url,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update notification"))?
    .ok_or_else(|| ApiError::not_found(helpers::NOTIFICATION_NOT_FOUND))?;

    Ok(Json(NotificationResponse::from_db(updated)))
}

pub(in crate::api::notifications) async fn delete_notification(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let notification = helpers::fetch_visible(&state, &user, &notification_id).await?;
    repositories::notifications::delete(state.db(), &notification.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete notification"))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::notifications) async fn unread_count(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread_count = repositories::notifications::unread_count(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unread notifications"))?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

pub(in crate::api::notifications) async fn mark_all_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let updated =
        repositories::notifications::mark_all_read(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to mark notifications as read"))?;
    tracing::debug!(user_id = %user.id, updated, "Notifications marked as read");
    Ok(Json(MessageResponse::new("All notifications marked as read")))
}

pub(in crate::api::notifications) async fn mark_read(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let notification = helpers::fetch_visible(&state, &user, &notification_id).await?;
    repositories::notifications::update(
        state.db(),
        &notification.id,
        UpdateNotification {
            title: None,
            message: None,
            priority: None,
            is_read: Some(true),
            action_url: None,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to mark notification as read"))?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}
