use rust_decimal::Decimal;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::CourseBundle;

const COLUMNS: &str = "\
    id, student_id, name, total_price, discount_percentage, final_price, created_at, updated_at";

pub(crate) struct CreateBundle<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) total_price: Decimal,
    pub(crate) discount_percentage: Decimal,
    pub(crate) final_price: Decimal,
    pub(crate) course_ids: &'a [String],
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    conn: &mut sqlx::PgConnection,
    params: CreateBundle<'_>,
) -> Result<CourseBundle, sqlx::Error> {
    let bundle = sqlx::query_as::<_, CourseBundle>(&format!(
        "INSERT INTO course_bundles (
            id, student_id, name, total_price, discount_percentage, final_price, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.name)
    .bind(params.total_price)
    .bind(params.discount_percentage)
    .bind(params.final_price)
    .bind(params.now)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO course_bundle_items (bundle_id, course_id)
         SELECT $1, unnest($2::text[])
         ON CONFLICT DO NOTHING",
    )
    .bind(params.id)
    .bind(params.course_ids)
    .execute(&mut *conn)
    .await?;

    Ok(bundle)
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<CourseBundle>, sqlx::Error> {
    sqlx::query_as::<_, CourseBundle>(&format!(
        "SELECT {COLUMNS} FROM course_bundles WHERE student_id = $1 ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_for_student(
    pool: &PgPool,
    id: &str,
    student_id: &str,
) -> Result<Option<CourseBundle>, sqlx::Error> {
    sqlx::query_as::<_, CourseBundle>(&format!(
        "SELECT {COLUMNS} FROM course_bundles WHERE id = $1 AND student_id = $2"
    ))
    .bind(id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<CourseBundle>, sqlx::Error> {
    sqlx::query_as::<_, CourseBundle>(&format!("SELECT {COLUMNS} FROM course_bundles WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn course_ids(
    executor: impl sqlx::PgExecutor<'_>,
    bundle_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT course_id FROM course_bundle_items WHERE bundle_id = $1 ORDER BY course_id",
    )
    .bind(bundle_id)
    .fetch_all(executor)
    .await
}

/// Bundles owned by `student_id` that include `course_id`.
pub(crate) async fn ids_containing_course(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT b.id FROM course_bundles b
         JOIN course_bundle_items i ON i.bundle_id = b.id
         WHERE b.student_id = $1 AND i.course_id = $2",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}
