use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{CourseResource, CourseSection, Lesson};
use crate::db::types::{LessonType, ResourceType};

const SECTION_COLUMNS: &str = "id, course_id, title, description, sort_order, created_at, updated_at";
const LESSON_COLUMNS: &str = "\
    id, section_id, title, content, video_url, video_duration_seconds, lesson_type, sort_order, \
    is_free, created_at, updated_at";
const RESOURCE_COLUMNS: &str =
    "id, course_id, title, resource_type, url, description, created_at, updated_at";

pub(crate) async fn list_sections(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseSection>, sqlx::Error> {
    sqlx::query_as::<_, CourseSection>(&format!(
        "SELECT {SECTION_COLUMNS} FROM course_sections
         WHERE course_id = $1
         ORDER BY sort_order, created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_section(
    pool: &PgPool,
    id: &str,
) -> Result<Option<CourseSection>, sqlx::Error> {
    sqlx::query_as::<_, CourseSection>(&format!(
        "SELECT {SECTION_COLUMNS} FROM course_sections WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateSection<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) sort_order: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_section(
    pool: &PgPool,
    params: CreateSection<'_>,
) -> Result<CourseSection, sqlx::Error> {
    sqlx::query_as::<_, CourseSection>(&format!(
        "INSERT INTO course_sections (id, course_id, title, description, sort_order, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {SECTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.sort_order)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Lessons of a course in section order, then lesson order.
pub(crate) async fn list_lessons_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(
        "SELECT l.id, l.section_id, l.title, l.content, l.video_url, l.video_duration_seconds,
                l.lesson_type, l.sort_order, l.is_free, l.created_at, l.updated_at
         FROM lessons l
         JOIN course_sections s ON s.id = l.section_id
         WHERE s.course_id = $1
         ORDER BY s.sort_order, s.created_at, l.sort_order, l.created_at",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn course_id_for_lesson(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT s.course_id FROM lessons l
         JOIN course_sections s ON s.id = l.section_id
         WHERE l.id = $1",
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_lessons(pool: &PgPool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM lessons l
         JOIN course_sections s ON s.id = l.section_id
         WHERE s.course_id = $1",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateLesson<'a> {
    pub(crate) id: &'a str,
    pub(crate) section_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) video_url: Option<&'a str>,
    pub(crate) video_duration_seconds: Option<i32>,
    pub(crate) lesson_type: LessonType,
    pub(crate) sort_order: i32,
    pub(crate) is_free: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_lesson(
    pool: &PgPool,
    params: CreateLesson<'_>,
) -> Result<Lesson, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "INSERT INTO lessons (
            id, section_id, title, content, video_url, video_duration_seconds, lesson_type,
            sort_order, is_free, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {LESSON_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.video_url)
    .bind(params.video_duration_seconds)
    .bind(params.lesson_type)
    .bind(params.sort_order)
    .bind(params.is_free)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_resources(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseResource>, sqlx::Error> {
    sqlx::query_as::<_, CourseResource>(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM course_resources WHERE course_id = $1 ORDER BY created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateResource<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) resource_type: ResourceType,
    pub(crate) url: &'a str,
    pub(crate) description: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_resource(
    pool: &PgPool,
    params: CreateResource<'_>,
) -> Result<CourseResource, sqlx::Error> {
    sqlx::query_as::<_, CourseResource>(&format!(
        "INSERT INTO course_resources (id, course_id, title, resource_type, url, description, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {RESOURCE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.resource_type)
    .bind(params.url)
    .bind(params.description)
    .bind(params.now)
    .fetch_one(pool)
    .await
}
