use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::UserProfile;

const COLUMNS: &str = "\
    user_id, date_of_birth, address, city, state, country, postal_code, linkedin_url, \
    github_url, portfolio_url, reset_otp, otp_created_at, reset_token, created_at, updated_at";

pub(crate) async fn find(pool: &PgPool, user_id: &str) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {COLUMNS} FROM user_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Profiles are created lazily on first access.
pub(crate) async fn get_or_create(
    pool: &PgPool,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_profiles (user_id, created_at, updated_at)
         VALUES ($1, $2, $2)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {COLUMNS} FROM user_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateProfile {
    pub date_of_birth: Option<Date>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    user_id: &str,
    params: UpdateProfile,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "UPDATE user_profiles SET
            date_of_birth = COALESCE($1, date_of_birth),
            address = COALESCE($2, address),
            city = COALESCE($3, city),
            state = COALESCE($4, state),
            country = COALESCE($5, country),
            postal_code = COALESCE($6, postal_code),
            linkedin_url = COALESCE($7, linkedin_url),
            github_url = COALESCE($8, github_url),
            portfolio_url = COALESCE($9, portfolio_url),
            updated_at = $10
         WHERE user_id = $11
         RETURNING {COLUMNS}",
    ))
    .bind(params.date_of_birth)
    .bind(params.address)
    .bind(params.city)
    .bind(params.state)
    .bind(params.country)
    .bind(params.postal_code)
    .bind(params.linkedin_url)
    .bind(params.github_url)
    .bind(params.portfolio_url)
    .bind(params.updated_at)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn store_otp(
    pool: &PgPool,
    user_id: &str,
    otp: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_profiles
         SET reset_otp = $1, otp_created_at = $2, reset_token = NULL, updated_at = $2
         WHERE user_id = $3",
    )
    .bind(otp)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn store_reset_token(
    pool: &PgPool,
    user_id: &str,
    token: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_profiles SET reset_token = $1, updated_at = $2 WHERE user_id = $3",
    )
    .bind(token)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn clear_reset_state(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_profiles
         SET reset_otp = NULL, otp_created_at = NULL, reset_token = NULL, updated_at = $1
         WHERE user_id = $2",
    )
    .bind(now)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}
