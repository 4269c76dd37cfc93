use serde::{Deserialize, Serialize};

use crate::schemas::user::{ProfileResponse, UserResponse};

#[derive(Debug, Serialize)]
pub(crate) struct AuthResponse {
    pub(crate) user: UserResponse,
    pub(crate) token: String,
}

/// Fields are optional so a missing one yields the endpoint's own message
/// instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChangePasswordRequest {
    #[serde(default)]
    pub(crate) old_password: Option<String>,
    #[serde(default)]
    pub(crate) new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordResponse {
    pub(crate) message: String,
    pub(crate) token: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SendOtpRequest {
    #[serde(default)]
    pub(crate) email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerifyOtpRequest {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyOtpResponse {
    pub(crate) message: String,
    pub(crate) reset_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResetPasswordRequest {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) reset_token: Option<String>,
    #[serde(default)]
    pub(crate) new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdateResponse {
    pub(crate) message: String,
    pub(crate) profile: ProfileResponse,
}
