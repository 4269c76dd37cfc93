mod handlers;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::core::state::AppState;

/// Max login attempts per email per window.
const LOGIN_RATE_LIMIT: u64 = 10;
const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;
/// OTP mails per email per window.
const OTP_RATE_LIMIT: u64 = 5;
const OTP_RATE_WINDOW_SECONDS: u64 = 600;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/profile", get(handlers::get_profile).patch(handlers::update_user))
        .route("/profile/update", patch(handlers::update_profile))
        .route("/update-profile", patch(handlers::update_profile))
        .route("/change-password", post(handlers::change_password))
        .route("/forgot-password/send-otp", post(handlers::send_otp))
        .route("/forgot-password/verify-otp", post(handlers::verify_otp))
        .route("/reset-password", post(handlers::reset_password))
        .route("/users", get(handlers::list_users))
        .route("/users/:user_id", get(handlers::get_user))
}

#[cfg(test)]
mod tests;
