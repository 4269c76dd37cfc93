use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::CourseReview;

const COLUMNS: &str = "id, course_id, student_id, rating, comment, created_at, updated_at";

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseReview>, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "SELECT {COLUMNS} FROM course_reviews WHERE course_id = $1 ORDER BY created_at DESC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateReview<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) rating: i16,
    pub(crate) comment: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateReview<'_>,
) -> Result<CourseReview, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "INSERT INTO course_reviews (id, course_id, student_id, rating, comment, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.student_id)
    .bind(params.rating)
    .bind(params.comment)
    .bind(params.now)
    .fetch_one(pool)
    .await
}
