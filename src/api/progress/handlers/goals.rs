use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::progress::{GoalCreate, GoalResponse, GoalUpdate};

const GOAL_NOT_FOUND: &str = "Learning goal not found";

pub(in crate::api::progress) async fn list_goals(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GoalResponse>>, ApiError> {
    let goals = repositories::progress::list_goals(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list learning goals"))?;
    Ok(Json(goals.into_iter().map(GoalResponse::from_db).collect()))
}

pub(in crate::api::progress) async fn create_goal(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<GoalCreate>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let goal = repositories::progress::create_goal(
        state.db(),
        repositories::progress::CreateGoal {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            title: payload.title.trim(),
            description: payload.description.trim(),
            goal_type: payload.goal_type,
            target_value: payload.target_value,
            current_value: payload.current_value,
            deadline: payload.deadline,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create learning goal"))?;

    Ok((StatusCode::CREATED, Json(GoalResponse::from_db(goal))))
}

pub(in crate::api::progress) async fn get_goal(
    Path(goal_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GoalResponse>, ApiError> {
    let goal = repositories::progress::find_goal(state.db(), &user.id, &goal_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch learning goal"))?
        .ok_or_else(|| ApiError::not_found(GOAL_NOT_FOUND))?;
    Ok(Json(GoalResponse::from_db(goal)))
}

pub(in crate::api::progress) async fn update_goal(
    Path(goal_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let goal = repositories::progress::update_goal(
        state.db(),
        &user.id,
        &goal_id,
        repositories::progress::UpdateGoal {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            goal_type: payload.goal_type,
            target_value: payload.target_value,
            current_value: payload.current_value,
            deadline: payload.deadline,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update learning goal"))?
    .ok_or_else(|| ApiError::not_found(GOAL_NOT_FOUND))?;

    Ok(Json(GoalResponse::from_db(goal)))
}

pub(in crate::api::progress) async fn delete_goal(
    Path(goal_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::progress::delete_goal(state.db(), &user.id, &goal_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete learning goal"))?;
    if !deleted {
        return Err(ApiError::not_found(GOAL_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}
