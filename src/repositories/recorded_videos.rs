use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::RecordedVideo;

const COLUMNS: &str = "\
    id, course_id, title, description, storage_key, content_type, size_bytes, uploaded_by, \
    created_at, updated_at";

pub(crate) struct CreateRecordedVideo<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) storage_key: &'a str,
    pub(crate) content_type: &'a str,
    pub(crate) size_bytes: i64,
    pub(crate) uploaded_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateRecordedVideo<'_>,
) -> Result<RecordedVideo, sqlx::Error> {
    sqlx::query_as::<_, RecordedVideo>(&format!(
        "INSERT INTO recorded_videos (
            id, course_id, title, description, storage_key, content_type, size_bytes,
            uploaded_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.storage_key)
    .bind(params.content_type)
    .bind(params.size_bytes)
    .bind(params.uploaded_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<RecordedVideo>, sqlx::Error> {
    sqlx::query_as::<_, RecordedVideo>(&format!(
        "SELECT {COLUMNS} FROM recorded_videos WHERE course_id = $1 ORDER BY created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}
