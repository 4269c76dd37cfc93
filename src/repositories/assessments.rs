use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Assessment, Question, QuestionOption};
use crate::db::types::{AssessmentType, QuestionType};

const COLUMNS: &str = "\
    id, course_id, title, description, assessment_type, total_marks, passing_marks, \
    duration_minutes, max_attempts, is_published, due_date, instructions, created_at, updated_at";
const QUESTION_COLUMNS: &str = "\
    id, assessment_id, question_text, question_type, marks, sort_order, explanation, \
    created_at, updated_at";
const OPTION_COLUMNS: &str =
    "id, question_id, option_text, is_correct, sort_order, created_at, updated_at";

/// Published assessments, optionally restricted to a set of courses.
pub(crate) async fn list_published(
    pool: &PgPool,
    course_ids: Option<&[String]>,
) -> Result<Vec<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {COLUMNS} FROM assessments
         WHERE is_published = TRUE AND ($1::text[] IS NULL OR course_id = ANY($1))
         ORDER BY created_at DESC"
    ))
    .bind(course_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!("SELECT {COLUMNS} FROM assessments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) struct CreateAssessment<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) total_marks: i32,
    pub(crate) passing_marks: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) is_published: bool,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) instructions: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAssessment<'_>,
) -> Result<Assessment, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "INSERT INTO assessments (
            id, course_id, title, description, assessment_type, total_marks, passing_marks,
            duration_minutes, max_attempts, is_published, due_date, instructions,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.assessment_type)
    .bind(params.total_marks)
    .bind(params.passing_marks)
    .bind(params.duration_minutes)
    .bind(params.max_attempts)
    .bind(params.is_published)
    .bind(params.due_date)
    .bind(params.instructions)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateAssessment {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) total_marks: Option<i32>,
    pub(crate) passing_marks: Option<i32>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) is_published: Option<bool>,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) instructions: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAssessment,
) -> Result<Option<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "UPDATE assessments SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            total_marks = COALESCE($3, total_marks),
            passing_marks = COALESCE($4, passing_marks),
            duration_minutes = COALESCE($5, duration_minutes),
            max_attempts = COALESCE($6, max_attempts),
            is_published = COALESCE($7, is_published),
            due_date = COALESCE($8, due_date),
            instructions = COALESCE($9, instructions),
            updated_at = $10
         WHERE id = $11
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.total_marks)
    .bind(params.passing_marks)
    .bind(params.duration_minutes)
    .bind(params.max_attempts)
    .bind(params.is_published)
    .bind(params.due_date)
    .bind(params.instructions)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) sort_order: i32,
    pub(crate) explanation: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_question(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, assessment_id, question_text, question_type, marks, sort_order, explanation,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {QUESTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.question_text)
    .bind(params.question_type)
    .bind(params.marks)
    .bind(params.sort_order)
    .bind(params.explanation)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) option_text: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) sort_order: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_option(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateOption<'_>,
) -> Result<QuestionOption, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "INSERT INTO question_options (
            id, question_id, option_text, is_correct, sort_order, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {OPTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.option_text)
    .bind(params.is_correct)
    .bind(params.sort_order)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions
         WHERE assessment_id = $1
         ORDER BY sort_order, created_at"
    ))
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options_for_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "SELECT o.id, o.question_id, o.option_text, o.is_correct, o.sort_order,
                o.created_at, o.updated_at
         FROM question_options o
         JOIN questions q ON q.id = o.question_id
         WHERE q.assessment_id = $1
         ORDER BY o.sort_order, o.created_at",
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_question(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_option(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_published_quizzes(
    pool: &PgPool,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM assessments
         WHERE course_id = $1 AND is_published = TRUE AND assessment_type = 'quiz'",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
}
