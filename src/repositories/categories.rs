use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Category;

const COLUMNS: &str = "id, name, slug, description, icon, is_active, created_at, updated_at";

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE is_active = TRUE ORDER BY name"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE lower(name) = lower($1)"
    ))
    .bind(name.trim())
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM categories WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn slug_taken(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateCategory<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    pub(crate) icon: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateCategory<'_>,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (id, name, slug, description, icon, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,TRUE,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.slug)
    .bind(params.description)
    .bind(params.icon)
    .bind(params.now)
    .fetch_one(pool)
    .await
}
