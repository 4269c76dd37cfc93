use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::notifications::NotificationContent;
use crate::schemas::notification::{BulkCreate, BulkResponse};
use crate::schemas::MessageResponse;

use super::super::helpers;

const ALREADY_SENT: &str = "Notification already sent";

pub(in crate::api::notifications) async fn list_bulk(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<BulkResponse>>, ApiError> {
    let rows = repositories::notifications::list_bulk(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list bulk notifications"))?;
    Ok(Json(rows.into_iter().map(BulkResponse::from_db).collect()))
}

pub(in crate::api::notifications) async fn create_bulk(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<BulkCreate>,
) -> Result<(StatusCode, Json<BulkResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !payload.target_all_users && payload.target_user_ids.is_empty() {
        return Err(ApiError::bad_request(
            "Either target_all_users or target_user_ids is required",
        ));
    }

    let mut target_user_ids = payload.target_user_ids;
    target_user_ids.sort();
    target_user_ids.dedup();

    let bulk = repositories::notifications::create_bulk(
        state.db(),
        repositories::notifications::CreateBulk {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            message: &payload.message,
            notification_type: payload.notification_type,
            priority: payload.priority,
            target_all_users: payload.target_all_users,
            target_user_ids,
            created_by: &admin.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create bulk notification"))?;

    Ok((StatusCode::CREATED, Json(BulkResponse::from_db(bulk))))
}

pub(in crate::api::notifications) async fn get_bulk(
    Path(bulk_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<BulkResponse>, ApiError> {
    let bulk = repositories::notifications::find_bulk(state.db(), &bulk_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bulk notification"))?
        .ok_or_else(|| ApiError::not_found(helpers::BULK_NOT_FOUND))?;
    Ok(Json(BulkResponse::from_db(bulk)))
}

pub(in crate::api::notifications) async fn delete_bulk(
    Path(bulk_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::notifications::delete_bulk(state.db(), &bulk_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete bulk notification"))?;
    if !deleted {
        return Err(ApiError::not_found(helpers::BULK_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Fans the message out once. The `sent_at IS NULL` claim runs in the same
/// transaction as the inserts, so a concurrent second send rolls back.
pub(in crate::api::notifications) async fn send_bulk(
    Path(bulk_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let bulk = repositories::notifications::find_bulk(&mut *tx, &bulk_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bulk notification"))?
        .ok_or_else(|| ApiError::not_found(helpers::BULK_NOT_FOUND))?;
    if bulk.sent_at.is_some() {
        return Err(ApiError::bad_request(ALREADY_SENT));
    }

    let recipients = if bulk.target_all_users {
        repositories::users::active_ids(&mut *tx).await
    } else {
        repositories::users::filter_active_ids(&mut *tx, &bulk.target_user_ids.0).await
    };
    let recipients =
        recipients.map_err(|e| ApiError::internal(e, "Failed to resolve recipients"))?;

    let now = primitive_now_utc();
    let ids: Vec<String> = recipients.iter().map(|_| Uuid::new_v4().to_string()).collect();
    let inserted = repositories::notifications::create_many(
        &mut *tx,
        &ids,
        &recipients,
        NotificationContent {
            title: &bulk.title,
            message: &bulk.message,
            notification_type: bulk.notification_type,
            priority: bulk.priority,
            course_id: None,
            action_url: None,
        },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create notifications"))?;

    let sent_count = i32::try_from(inserted).unwrap_or(i32::MAX);
    let claimed =
        repositories::notifications::mark_bulk_sent(&mut *tx, &bulk.id, sent_count, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to mark bulk notification as sent"))?;
    if !claimed {
        return Err(ApiError::bad_request(ALREADY_SENT));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        bulk_id = %bulk.id,
        admin_id = %admin.id,
        sent_count,
        "Bulk notification sent"
    );
    Ok(Json(MessageResponse::new(format!("Notification sent to {sent_count} users"))))
}
