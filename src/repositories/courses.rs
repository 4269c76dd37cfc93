use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Course;
use crate::db::types::DifficultyLevel;

pub(crate) const COLUMNS: &str = "\
    id, category_id, title, slug, description, instructor, price, discounted_price, \
    duration_hours, difficulty_level, prerequisites, what_you_learn, requirements, \
    is_published, enrollment_count, rating, created_at, updated_at";

#[derive(Debug, Default, Clone)]
pub(crate) struct CourseFilter {
    pub(crate) is_published: Option<bool>,
    pub(crate) category: Option<String>,
    pub(crate) difficulty_level: Option<DifficultyLevel>,
    pub(crate) search: Option<String>,
    pub(crate) ordering: Option<String>,
}

/// Maps a public `ordering` value to a SQL clause. Unknown values fall back
/// to newest first.
pub(crate) fn order_clause(ordering: Option<&str>) -> &'static str {
    match ordering.map(str::trim) {
        Some("price") => "price ASC, created_at DESC",
        Some("-price") => "price DESC, created_at DESC",
        Some("created_at") => "created_at ASC",
        Some("rating") => "rating ASC, created_at DESC",
        Some("-rating") => "rating DESC, created_at DESC",
        Some("enrollment_count") => "enrollment_count ASC, created_at DESC",
        Some("-enrollment_count") => "enrollment_count DESC, created_at DESC",
        _ => "created_at DESC",
    }
}

pub(crate) async fn list(pool: &PgPool, filter: &CourseFilter) -> Result<Vec<Course>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM courses c WHERE TRUE",
        prefixed_columns("c")
    ));

    if let Some(is_published) = filter.is_published {
        builder.push(" AND c.is_published = ");
        builder.push_bind(is_published);
    }

    if let Some(category) = filter.category.as_deref().filter(|value| !value.is_empty()) {
        builder.push(" AND c.category_id IN (SELECT id FROM categories WHERE slug = ");
        builder.push_bind(category.to_string());
        builder.push(" OR lower(name) = lower(");
        builder.push_bind(category.to_string());
        builder.push("))");
    }

    if let Some(level) = filter.difficulty_level {
        builder.push(" AND c.difficulty_level = ");
        builder.push_bind(level);
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (c.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.instructor ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY ");
    builder.push(order_clause(filter.ordering.as_deref()));

    builder.build_query_as::<Course>().fetch_all(pool).await
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|column| format!("{alias}.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Accepts either the id or the slug.
pub(crate) async fn find_by_id_or_slug(
    pool: &PgPool,
    key: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 OR slug = $1 ORDER BY (id = $1) DESC LIMIT 1"
    ))
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_many(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = ANY($1) ORDER BY title"
    ))
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn slug_taken(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub(crate) async fn published_name_slugs(
    pool: &PgPool,
) -> Result<Vec<(String, String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, title, slug FROM courses WHERE is_published = TRUE ORDER BY title",
    )
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) category_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    pub(crate) instructor: &'a str,
    pub(crate) price: Decimal,
    pub(crate) discounted_price: Option<Decimal>,
    pub(crate) duration_hours: i32,
    pub(crate) difficulty_level: DifficultyLevel,
    pub(crate) prerequisites: &'a str,
    pub(crate) what_you_learn: Vec<String>,
    pub(crate) requirements: Vec<String>,
    pub(crate) is_published: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, category_id, title, slug, description, instructor, price, discounted_price,
            duration_hours, difficulty_level, prerequisites, what_you_learn, requirements,
            is_published, enrollment_count, rating, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,0,0,$15,$15)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.category_id)
    .bind(params.title)
    .bind(params.slug)
    .bind(params.description)
    .bind(params.instructor)
    .bind(params.price)
    .bind(params.discounted_price)
    .bind(params.duration_hours)
    .bind(params.difficulty_level)
    .bind(params.prerequisites)
    .bind(Json(params.what_you_learn))
    .bind(Json(params.requirements))
    .bind(params.is_published)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateCourse {
    pub(crate) category_id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) instructor: Option<String>,
    pub(crate) price: Option<Decimal>,
    pub(crate) discounted_price: Option<Decimal>,
    pub(crate) duration_hours: Option<i32>,
    pub(crate) difficulty_level: Option<DifficultyLevel>,
    pub(crate) prerequisites: Option<String>,
    pub(crate) what_you_learn: Option<Vec<String>>,
    pub(crate) requirements: Option<Vec<String>>,
    pub(crate) is_published: Option<bool>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateCourse,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            category_id = COALESCE($1, category_id),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            instructor = COALESCE($4, instructor),
            price = COALESCE($5, price),
            discounted_price = COALESCE($6, discounted_price),
            duration_hours = COALESCE($7, duration_hours),
            difficulty_level = COALESCE($8, difficulty_level),
            prerequisites = COALESCE($9, prerequisites),
            what_you_learn = COALESCE($10, what_you_learn),
            requirements = COALESCE($11, requirements),
            is_published = COALESCE($12, is_published),
            updated_at = $13
         WHERE id = $14
         RETURNING {COLUMNS}",
    ))
    .bind(params.category_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructor)
    .bind(params.price)
    .bind(params.discounted_price)
    .bind(params.duration_hours)
    .bind(params.difficulty_level)
    .bind(params.prerequisites)
    .bind(params.what_you_learn.map(Json))
    .bind(params.requirements.map(Json))
    .bind(params.is_published)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_many(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ANY($1)")
        .bind(ids)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn set_published(
    pool: &PgPool,
    ids: &[String],
    is_published: bool,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE courses SET is_published = $1, updated_at = $2 WHERE id = ANY($3)")
            .bind(is_published)
            .bind(now)
            .bind(ids)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn increment_enrollment_count(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET enrollment_count = enrollment_count + 1 WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Recomputes the stored rating from all reviews, rounded to 2 dp.
pub(crate) async fn refresh_rating(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET
            rating = COALESCE(
                (SELECT ROUND(AVG(rating)::numeric, 2) FROM course_reviews WHERE course_id = $1),
                0
            ),
            updated_at = $2
         WHERE id = $1",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_whitelisted() {
        assert_eq!(order_clause(Some("-price")), "price DESC, created_at DESC");
        assert_eq!(order_clause(Some("rating; DROP TABLE courses")), "created_at DESC");
        assert_eq!(order_clause(None), "created_at DESC");
    }

    #[test]
    fn prefixed_columns_qualify_every_column() {
        let columns = prefixed_columns("c");
        assert!(columns.starts_with("c.id, c.category_id"));
        assert!(columns.ends_with("c.updated_at"));
    }
}
