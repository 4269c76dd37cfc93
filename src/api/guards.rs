use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::repositories;

const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// Bearer user when a valid token is present. Anonymous otherwise; a bad
/// token on a public route is treated the same as no token.
pub(crate) struct MaybeUser(pub(crate) Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = security::verify_token(token, state.settings())
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let user = repositories::users::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("User not found"));
    };

    if !user.is_active || claims.ver != user.token_version {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts).ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;
        let user = resolve_user(&app_state, token).await?;

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };

        match resolve_user(state, token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(ApiError::Unauthorized(_)) => Ok(MaybeUser(None)),
            Err(err) => Err(err),
        }
    }
}

/// Admins pass; students need an active enrollment in the course.
pub(crate) async fn require_enrollment(
    state: &AppState,
    user: &User,
    course_id: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    if user.is_admin() {
        return Ok(());
    }
    require_active_enrollment(state, user, course_id, message).await
}

/// Same check without the admin bypass.
pub(crate) async fn require_active_enrollment(
    state: &AppState,
    user: &User,
    course_id: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    let enrolled = repositories::enrollments::is_active(state.db(), &user.id, course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if enrolled {
        Ok(())
    } else {
        Err(ApiError::Forbidden(message))
    }
}
