use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::{format_date, format_primitive};
use crate::db::models::{User, UserProfile};
use crate::db::types::UserType;
use crate::schemas::datetime::deserialize_option_date;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserRegister {
    #[validate(email(message = "Enter a valid email address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 150, message = "username must be 1-150 characters"))]
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) password_confirm: String,
    #[serde(default)]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) last_name: String,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserUpdate {
    #[serde(default)]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "username must be 1-150 characters"))]
    pub(crate) username: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date_of_birth: Option<Date>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    pub(crate) city: Option<String>,
    #[serde(default)]
    pub(crate) state: Option<String>,
    #[serde(default)]
    pub(crate) country: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "postal_code must be at most 20 characters"))]
    pub(crate) postal_code: Option<String>,
    #[serde(default)]
    #[validate(url(message = "linkedin_url must be a valid URL"))]
    pub(crate) linkedin_url: Option<String>,
    #[serde(default)]
    #[validate(url(message = "github_url must be a valid URL"))]
    pub(crate) github_url: Option<String>,
    #[serde(default)]
    #[validate(url(message = "portfolio_url must be a valid URL"))]
    pub(crate) portfolio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) full_name: String,
    pub(crate) user_type: UserType,
    pub(crate) phone: Option<String>,
    pub(crate) bio: String,
    pub(crate) is_active: bool,
    pub(crate) is_verified: bool,
    pub(crate) date_joined: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            user_type: user.user_type,
            phone: user.phone,
            bio: user.bio,
            is_active: user.is_active,
            is_verified: user.is_verified,
            date_joined: format_primitive(user.date_joined),
        }
    }
}

/// Profile fields only; reset secrets never leave the server.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    pub(crate) date_of_birth: Option<String>,
    pub(crate) address: String,
    pub(crate) city: String,
    pub(crate) state: String,
    pub(crate) country: String,
    pub(crate) postal_code: String,
    pub(crate) linkedin_url: Option<String>,
    pub(crate) github_url: Option<String>,
    pub(crate) portfolio_url: Option<String>,
    pub(crate) updated_at: String,
}

impl ProfileResponse {
    pub(crate) fn from_db(profile: UserProfile) -> Self {
        Self {
            date_of_birth: profile.date_of_birth.map(format_date),
            address: profile.address,
            city: profile.city,
            state: profile.state,
            country: profile.country,
            postal_code: profile.postal_code,
            linkedin_url: profile.linkedin_url,
            github_url: profile.github_url,
            portfolio_url: profile.portfolio_url,
            updated_at: format_primitive(profile.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UserWithProfileResponse {
    #[serde(flatten)]
    pub(crate) user: UserResponse,
    pub(crate) profile: ProfileResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserEnvelope {
    pub(crate) user: UserResponse,
}
