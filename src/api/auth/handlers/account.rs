use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::auth::{LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_password_len;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserType;
use crate::repositories;
use crate::schemas::auth::{AuthResponse, ProfileUpdateResponse};
use crate::schemas::user::{
    ProfileResponse, ProfileUpdate, UserLogin, UserRegister, UserResponse, UserUpdate,
    UserWithProfileResponse,
};
use crate::schemas::MessageResponse;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(in crate::api::auth) async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_password_len(&payload.password)?;
    if payload.password != payload.password_confirm {
        return Err(ApiError::bad_request("Passwords don't match"));
    }

    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim();

    let email_taken = repositories::users::email_taken(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if email_taken {
        return Err(ApiError::bad_request("A user with that email already exists"));
    }

    let username_taken = repositories::users::username_taken(state.db(), username, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if username_taken {
        return Err(ApiError::bad_request("A user with that username already exists"));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            username,
            hashed_password,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            user_type: UserType::Student,
            phone: payload.phone.as_deref().map(str::trim).filter(|value| !value.is_empty()),
            is_verified: false,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::bad_request("A user with that email already exists")
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user: UserResponse::from_db(user), token })))
}

pub(in crate::api::auth) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<AuthResponse>, ApiError> {
    let allowed = state
        .redis()
        .allow("login", &payload.email, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), payload.email.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("User account is disabled"));
    }

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse { user: UserResponse::from_db(user), token }))
}

pub(in crate::api::auth) async fn logout(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    repositories::users::bump_token_version(state.db(), &user.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to log out"))?;

    Ok(Json(MessageResponse::new("Logout successful")))
}

pub(in crate::api::auth) async fn get_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserWithProfileResponse>, ApiError> {
    with_profile(&state, user).await.map(Json)
}

pub(in crate::api::auth) async fn update_user(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserWithProfileResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let username = payload.username.map(|value| value.trim().to_string());
    if let Some(username) = username.as_deref() {
        let taken = repositories::users::username_taken(state.db(), username, Some(&user.id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check username"))?;
        if taken {
            return Err(ApiError::bad_request("A user with that username already exists"));
        }
    }

    let updated = repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            username,
            phone: payload.phone,
            bio: payload.bio,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    with_profile(&state, updated).await.map(Json)
}

pub(in crate::api::auth) async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    repositories::user_profiles::get_or_create(state.db(), &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load profile"))?;

    let profile = repositories::user_profiles::update(
        state.db(),
        &user.id,
        repositories::user_profiles::UpdateProfile {
            date_of_birth: payload.date_of_birth,
            address: payload.address,
            city: payload.city,
            state: payload.state,
            country: payload.country,
            postal_code: payload.postal_code,
            linkedin_url: payload.linkedin_url,
            github_url: payload.github_url,
            portfolio_url: payload.portfolio_url,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        profile: ProfileResponse::from_db(profile),
    }))
}

pub(super) fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    security::create_access_token(&user.id, user.token_version, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))
}

pub(super) async fn with_profile(
    state: &AppState,
    user: User,
) -> Result<UserWithProfileResponse, ApiError> {
    let profile =
        repositories::user_profiles::get_or_create(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load profile"))?;

    Ok(UserWithProfileResponse {
        user: UserResponse::from_db(user),
        profile: ProfileResponse::from_db(profile),
    })
}
