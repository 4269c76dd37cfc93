use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{StudentAnswer, StudentAssessment};
use crate::db::types::AttemptStatus;

const COLUMNS: &str = "\
    id, student_id, assessment_id, attempt_number, started_at, submitted_at, time_taken_minutes, \
    obtained_marks, status, feedback, created_at, updated_at";
const ANSWER_COLUMNS: &str = "\
    id, student_assessment_id, question_id, selected_option_id, answer_text, marks_awarded, \
    is_correct, created_at, updated_at";

pub(crate) async fn count_for(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    assessment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM student_assessments WHERE student_id = $1 AND assessment_id = $2",
    )
    .bind(student_id)
    .bind(assessment_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    assessment_id: &str,
    attempt_number: i32,
    now: PrimitiveDateTime,
) -> Result<StudentAssessment, sqlx::Error> {
    sqlx::query_as::<_, StudentAssessment>(&format!(
        "INSERT INTO student_assessments (
            id, student_id, assessment_id, attempt_number, started_at, status, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, 'in_progress', $5, $5)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(student_id)
    .bind(assessment_id)
    .bind(attempt_number)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Latest in-progress attempt, row-locked. A concurrent submit waiting on
/// the lock re-checks the status filter and gets `None` once the first
/// submit commits.
pub(crate) async fn lock_latest(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    assessment_id: &str,
) -> Result<Option<StudentAssessment>, sqlx::Error> {
    sqlx::query_as::<_, StudentAssessment>(&format!(
        "SELECT {COLUMNS} FROM student_assessments
         WHERE student_id = $1 AND assessment_id = $2 AND status = 'in_progress'
         ORDER BY attempt_number DESC
         LIMIT 1
         FOR UPDATE"
    ))
    .bind(student_id)
    .bind(assessment_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option_id: Option<&'a str>,
    pub(crate) answer_text: &'a str,
    pub(crate) marks_awarded: Decimal,
    pub(crate) is_correct: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn insert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<StudentAnswer, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "INSERT INTO student_answers (
            id, student_assessment_id, question_id, selected_option_id, answer_text,
            marks_awarded, is_correct, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {ANSWER_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.selected_option_id)
    .bind(params.answer_text)
    .bind(params.marks_awarded)
    .bind(params.is_correct)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn finish(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: AttemptStatus,
    obtained_marks: Decimal,
    time_taken_minutes: i32,
    now: PrimitiveDateTime,
) -> Result<StudentAssessment, sqlx::Error> {
    sqlx::query_as::<_, StudentAssessment>(&format!(
        "UPDATE student_assessments SET
            status = $1,
            obtained_marks = $2,
            time_taken_minutes = $3,
            submitted_at = $4,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(obtained_marks)
    .bind(time_taken_minutes)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_for(
    pool: &PgPool,
    student_id: &str,
    assessment_id: &str,
) -> Result<Vec<StudentAssessment>, sqlx::Error> {
    sqlx::query_as::<_, StudentAssessment>(&format!(
        "SELECT {COLUMNS} FROM student_assessments
         WHERE student_id = $1 AND assessment_id = $2
         ORDER BY attempt_number DESC"
    ))
    .bind(student_id)
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct AttemptWithTitle {
    #[sqlx(flatten)]
    pub(crate) attempt: StudentAssessment,
    pub(crate) assessment_title: String,
    pub(crate) total_marks: i32,
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<AttemptWithTitle>, sqlx::Error> {
    sqlx::query_as::<_, AttemptWithTitle>(
        "SELECT sa.id, sa.student_id, sa.assessment_id, sa.attempt_number, sa.started_at,
                sa.submitted_at, sa.time_taken_minutes, sa.obtained_marks, sa.status, sa.feedback,
                sa.created_at, sa.updated_at,
                a.title AS assessment_title, a.total_marks
         FROM student_assessments sa
         JOIN assessments a ON a.id = sa.assessment_id
         WHERE sa.student_id = $1
         ORDER BY sa.started_at DESC, sa.attempt_number DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct QuizBest {
    pub(crate) total_marks: i32,
    pub(crate) best_marks: Decimal,
}

/// Best finished attempt per published quiz of the course.
pub(crate) async fn best_quiz_scores(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<QuizBest>, sqlx::Error> {
    sqlx::query_as::<_, QuizBest>(
        "SELECT a.total_marks, MAX(sa.obtained_marks) AS best_marks
         FROM assessments a
         JOIN student_assessments sa ON sa.assessment_id = a.id
         WHERE a.course_id = $1
           AND a.is_published = TRUE
           AND a.assessment_type = 'quiz'
           AND sa.student_id = $2
           AND sa.status IN ('submitted', 'graded')
         GROUP BY a.id, a.total_marks",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}
