use axum::{extract::State, Json};
use time::Duration;

use crate::api::auth::{OTP_RATE_LIMIT, OTP_RATE_WINDOW_SECONDS};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_password_len;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::auth::{
    ChangePasswordRequest, ChangePasswordResponse, ResetPasswordRequest, SendOtpRequest,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::schemas::MessageResponse;
use crate::services::codes::{generate_otp, generate_reset_token, OTP_TTL_MINUTES};
use crate::services::mailer::otp_mail;

use super::account::issue_token;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(in crate::api::auth) async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    let (Some(old_password), Some(new_password)) =
        (payload.old_password.as_deref(), payload.new_password.as_deref())
    else {
        return Err(ApiError::bad_request("Both old_password and new_password are required"));
    };

    let verified = security::verify_password(old_password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::bad_request("Old password is incorrect"));
    }
    validate_password_len(new_password)?;

    let hashed = security::hash_password(new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let updated =
        repositories::users::set_password(state.db(), &user.id, &hashed, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    let token = issue_token(&state, &updated)?;
    Ok(Json(ChangePasswordResponse {
        message: "Password changed successfully".to_string(),
        token,
    }))
}

pub(in crate::api::auth) async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = non_blank(payload.email.as_deref())
        .ok_or_else(|| ApiError::bad_request("Email is required"))?;

    let allowed = state
        .redis()
        .allow("otp", email, OTP_RATE_LIMIT, OTP_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many OTP requests, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found("User with this email does not exist"))?;

    let now = primitive_now_utc();
    repositories::user_profiles::get_or_create(state.db(), &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load profile"))?;

    let otp = generate_otp();
    repositories::user_profiles::store_otp(state.db(), &user.id, &otp, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store OTP"))?;

    state.mailer().dispatch(otp_mail(&user.email, &otp));
    tracing::info!(user_id = %user.id, "Password reset OTP issued");

    Ok(Json(MessageResponse::new("OTP sent successfully to your email")))
}

pub(in crate::api::auth) async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let (Some(email), Some(otp)) =
        (non_blank(payload.email.as_deref()), non_blank(payload.otp.as_deref()))
    else {
        return Err(ApiError::bad_request("Email and OTP are required"));
    };

    let user = repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::bad_request("Invalid email or OTP"))?;
    let profile = repositories::user_profiles::find(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load profile"))?
        .ok_or_else(|| ApiError::bad_request("Invalid email or OTP"))?;

    let now = primitive_now_utc();
    let fresh = profile
        .otp_created_at
        .is_some_and(|created| now - created <= Duration::minutes(OTP_TTL_MINUTES));
    if profile.reset_otp.as_deref() != Some(otp) || !fresh {
        return Err(ApiError::bad_request("Invalid or expired OTP"));
    }

    let reset_token = generate_reset_token();
    repositories::user_profiles::store_reset_token(state.db(), &user.id, &reset_token, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store reset token"))?;

    Ok(Json(VerifyOtpResponse { message: "OTP verified successfully".to_string(), reset_token }))
}

pub(in crate::api::auth) async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(email), Some(reset_token), Some(new_password)) = (
        non_blank(payload.email.as_deref()),
        non_blank(payload.reset_token.as_deref()),
        payload.new_password.as_deref().filter(|value| !value.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email, reset_token, and new_password are required"));
    };

    let user = repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::bad_request("Invalid email or reset token"))?;
    let profile = repositories::user_profiles::find(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load profile"))?
        .ok_or_else(|| ApiError::bad_request("Invalid email or reset token"))?;

    if profile.reset_token.as_deref() != Some(reset_token) {
        return Err(ApiError::bad_request("Invalid reset token"));
    }
    validate_password_len(new_password)?;

    let hashed = security::hash_password(new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::users::set_password(&mut *tx, &user.id, &hashed, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update password"))?;
    repositories::user_profiles::clear_reset_state(&mut *tx, &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear reset state"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit password reset"))?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
