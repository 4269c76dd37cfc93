use rust_decimal::Decimal;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Enrollment;

const COLUMNS: &str =
    "id, student_id, course_id, enrolled_at, is_active, completion_percentage, payment_id";

pub(crate) struct EnrollOutcome {
    pub(crate) enrollment: Enrollment,
    pub(crate) created: bool,
}

/// Get-or-create. A previously deactivated enrollment is reactivated and
/// reported as created.
pub(crate) async fn enroll(
    conn: &mut sqlx::PgConnection,
    id: &str,
    student_id: &str,
    course_id: &str,
    payment_id: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<EnrollOutcome, sqlx::Error> {
    let inserted = sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (id, student_id, course_id, enrolled_at, is_active, completion_percentage, payment_id)
         VALUES ($1, $2, $3, $4, TRUE, 0, $5)
         ON CONFLICT (student_id, course_id) DO UPDATE
             SET is_active = TRUE,
                 enrolled_at = EXCLUDED.enrolled_at,
                 payment_id = COALESCE(EXCLUDED.payment_id, enrollments.payment_id)
             WHERE enrollments.is_active = FALSE
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(student_id)
    .bind(course_id)
    .bind(now)
    .bind(payment_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(enrollment) = inserted {
        return Ok(EnrollOutcome { enrollment, created: true });
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(EnrollOutcome { enrollment, created: false })
}

pub(crate) async fn is_active(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM enrollments
            WHERE student_id = $1 AND course_id = $2 AND is_active = TRUE
        )",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_active_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments
         WHERE student_id = $1 AND is_active = TRUE
         ORDER BY enrolled_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn active_course_ids(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT course_id FROM enrollments WHERE student_id = $1 AND is_active = TRUE",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn active_student_ids(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT e.student_id FROM enrollments e
         JOIN users u ON u.id = e.student_id
         WHERE e.course_id = $1 AND e.is_active = TRUE AND u.is_active = TRUE
         ORDER BY e.enrolled_at",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_active_for_courses(
    executor: impl sqlx::PgExecutor<'_>,
    course_ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ANY($1) AND is_active = TRUE",
    )
    .bind(course_ids)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_completion(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
    completion_percentage: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE enrollments SET completion_percentage = $1
         WHERE student_id = $2 AND course_id = $3",
    )
    .bind(completion_percentage)
    .bind(student_id)
    .bind(course_id)
    .execute(pool)
    .await?;
    Ok(())
}
