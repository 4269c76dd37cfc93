use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::live::{
    LiveClassCreate, LiveClassResponse, LiveClassUpdate, LiveStatusResponse,
};
use crate::services::jitsi;

use super::super::helpers;

pub(in crate::api::live) async fn create_class(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<LiveClassCreate>,
) -> Result<(StatusCode, Json<LiveClassResponse>), ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Only admin users can create live classes."));
    }
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.scheduled_end <= payload.scheduled_start {
        return Err(ApiError::bad_request("scheduled_end must be after scheduled_start"));
    }

    let course = repositories::courses::find_by_id(state.db(), payload.course.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let title = payload.title.trim();
    let room = jitsi::new_room_name(title);
    let meeting_url = jitsi::meeting_url(&state.settings().jitsi().domain, &room);
    let instructor = payload
        .instructor
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user.full_name());

    let class = repositories::live_classes::create(
        state.db(),
        repositories::live_classes::CreateLiveClass {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            title,
            description: payload.description.trim(),
            instructor: &instructor,
            scheduled_start: payload.scheduled_start,
            scheduled_end: payload.scheduled_end,
            meeting_id: &room,
            meeting_url: &meeting_url,
            max_participants: payload.max_participants,
            created_by: &user.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create live class"))?;

    tracing::info!(class_id = %class.id, course_id = %course.id, room = %room, "Live class scheduled");
    Ok((StatusCode::CREATED, Json(LiveClassResponse::from_db(class))))
}

pub(in crate::api::live) async fn list_classes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LiveClassResponse>>, ApiError> {
    helpers::sync_statuses(&state).await?;
    let course_ids = helpers::visible_course_ids(&state, &user).await?;

    let classes = repositories::live_classes::list(state.db(), course_ids.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list live classes"))?;

    Ok(Json(classes.into_iter().map(LiveClassResponse::from_db).collect()))
}

pub(in crate::api::live) async fn upcoming_classes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LiveClassResponse>>, ApiError> {
    helpers::sync_statuses(&state).await?;
    let course_ids = helpers::visible_course_ids(&state, &user).await?;

    let classes = repositories::live_classes::list_upcoming(
        state.db(),
        course_ids.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list upcoming classes"))?;

    Ok(Json(classes.into_iter().map(LiveClassResponse::from_db).collect()))
}

pub(in crate::api::live) async fn get_class(
    Path(class_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<LiveClassResponse>, ApiError> {
    helpers::sync_statuses(&state).await?;
    let class = helpers::fetch_class(&state, &class_id).await?;
    require_enrollment(&state, &user, &class.course_id, "Access denied").await?;

    Ok(Json(LiveClassResponse::from_db(class)))
}

pub(in crate::api::live) async fn update_class(
    Path(class_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<LiveClassUpdate>,
) -> Result<Json<LiveClassResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let current = helpers::fetch_class(&state, &class_id).await?;

    let start = payload.scheduled_start.unwrap_or(current.scheduled_start);
    let end = payload.scheduled_end.unwrap_or(current.scheduled_end);
    if end <= start {
        return Err(ApiError::bad_request("scheduled_end must be after scheduled_start"));
    }

    let updated = repositories::live_classes::update(
        state.db(),
        &current.id,
        repositories::live_classes::UpdateLiveClass {
            title: payload.title.map(|value| value.trim().to_string()),
            description: payload.description,
            instructor: payload.instructor,
            scheduled_start: payload.scheduled_start,
            scheduled_end: payload.scheduled_end,
            max_participants: payload.max_participants,
            status: payload.status,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update live class"))?
    .ok_or_else(|| ApiError::not_found(helpers::CLASS_NOT_FOUND))?;

    Ok(Json(LiveClassResponse::from_db(updated)))
}

pub(in crate::api::live) async fn class_status(
    Path(class_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<LiveStatusResponse>, ApiError> {
    helpers::sync_statuses(&state).await?;
    let class = helpers::fetch_class(&state, &class_id).await?;
    require_enrollment(&state, &user, &class.course_id, "Access denied").await?;

    Ok(Json(LiveStatusResponse::from_db(class)))
}

pub(in crate::api::live) async fn course_classes(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LiveClassResponse>>, ApiError> {
    require_enrollment(&state, &user, &course_id, "Access denied").await?;
    helpers::sync_statuses(&state).await?;

    let classes = repositories::live_classes::list_for_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list live classes"))?;

    Ok(Json(classes.into_iter().map(LiveClassResponse::from_db).collect()))
}
