use sqlx::{PgPool, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserType;

const COLUMNS: &str = "\
    id, email, username, hashed_password, first_name, last_name, user_type, phone, bio, \
    is_active, is_verified, token_version, date_joined, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// `exclude_id` lets a user keep their own username on update.
pub(crate) async fn username_taken(
    pool: &PgPool,
    username: &str,
    exclude_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM users WHERE username = $1 AND ($2::text IS NULL OR id <> $2)
        )",
    )
    .bind(username)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub hashed_password: String,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub user_type: UserType,
    pub phone: Option<&'a str>,
    pub is_verified: bool,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, username, hashed_password, first_name, last_name, user_type, phone,
            is_active, is_verified, token_version, date_joined, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,TRUE,$9,0,$10,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.user_type)
    .bind(params.phone)
    .bind(params.is_verified)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateUser,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            username = COALESCE($3, username),
            phone = COALESCE($4, phone),
            bio = COALESCE($5, bio),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.username)
    .bind(params.phone)
    .bind(params.bio)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Sets a new password hash and revokes every token issued so far.
pub(crate) async fn set_password(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    hashed_password: &str,
    now: PrimitiveDateTime,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users
         SET hashed_password = $1, token_version = token_version + 1, updated_at = $2
         WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn bump_token_version(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET token_version = token_version + 1, updated_at = $1 WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn promote_admin(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users
         SET hashed_password = $1, user_type = 'admin', is_active = TRUE, is_verified = TRUE,
             updated_at = $2
         WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Students matching `search` against username or email.
pub(crate) async fn list_students(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM users WHERE user_type <> 'admin'"));

    if let Some(search) = search.map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (username ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY date_joined DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn active_ids(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE is_active = TRUE ORDER BY id")
        .fetch_all(executor)
        .await
}

/// Keeps only ids of existing active users, in the order given.
pub(crate) async fn filter_active_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM users WHERE id = ANY($1) AND is_active = TRUE ORDER BY id",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}
