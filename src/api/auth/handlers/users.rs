use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::user::{UserEnvelope, UserListQuery, UserResponse};

pub(in crate::api::auth) async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list_students(
        state.db(),
        params.search.as_deref(),
        params.skip,
        params.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

pub(in crate::api::auth) async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserEnvelope { user: UserResponse::from_db(user) }))
}
