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
use crate::schemas::notification::{
    NotificationTemplateCreate, NotificationTemplateResponse, NotificationTemplateUpdate,
};

use super::super::helpers;

pub(in crate::api::notifications) async fn list_templates(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationTemplateResponse>>, ApiError> {
    let templates = repositories::notifications::list_templates(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list notification templates"))?;
    Ok(Json(templates.into_iter().map(NotificationTemplateResponse::from_db).collect()))
}

pub(in crate::api::notifications) async fn create_template(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NotificationTemplateCreate>,
) -> Result<(StatusCode, Json<NotificationTemplateResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let template = repositories::notifications::create_template(
        state.db(),
        repositories::notifications::CreateTemplate {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            notification_type: payload.notification_type,
            title_template: &payload.title_template,
            message_template: &payload.message_template,
            is_active: payload.is_active,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Notification template name already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create notification template")
        }
    })?;

    Ok((StatusCode::CREATED, Json(NotificationTemplateResponse::from_db(template))))
}

pub(in crate::api::notifications) async fn get_template(
    Path(template_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<NotificationTemplateResponse>, ApiError> {
    let template = repositories::notifications::find_template(state.db(), &template_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch notification template"))?
        .ok_or_else(|| ApiError::not_found(helpers::TEMPLATE_NOT_FOUND))?;
    Ok(Json(NotificationTemplateResponse::from_db(template)))
}

pub(in crate::api::notifications) async fn update_template(
    Path(template_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NotificationTemplateUpdate>,
) -> Result<Json<NotificationTemplateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let template = repositories::notifications::update_template(
        state.db(),
        &template_id,
        repositories::notifications::UpdateTemplate {
            name: payload.name.map(|name| name.trim().to_string()),
            notification_type: payload.notification_type,
            title_template: payload.title_template,
            message_template: payload.message_template,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Notification template name already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to update notification template")
        }
    })?
    .ok_or_else(|| ApiError::not_found(helpers::TEMPLATE_NOT_FOUND))?;

    Ok(Json(NotificationTemplateResponse::from_db(template)))
}

pub(in crate::api::notifications) async fn delete_template(
    Path(template_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::notifications::delete_template(state.db(), &template_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete notification template"))?;
    if !deleted {
        return Err(ApiError::not_found(helpers::TEMPLATE_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}
