use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::CourseNote;

const COLUMNS: &str = "\
    id, course_id, title, description, file_size, uploaded_by, is_active, download_count, \
    created_at, updated_at";

pub(crate) async fn list_active(
    pool: &PgPool,
    course_id: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<CourseNote>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM course_notes WHERE is_active = TRUE"
    ));

    if let Some(course_id) = course_id {
        builder.push(" AND course_id = ");
        builder.push_bind(course_id.to_string());
    }

    if let Some(search) = search.map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<CourseNote>().fetch_all(pool).await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<CourseNote>, sqlx::Error> {
    sqlx::query_as::<_, CourseNote>(&format!(
        "SELECT {COLUMNS} FROM course_notes WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateNote<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) pdf_data: &'a [u8],
    pub(crate) uploaded_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateNote<'_>) -> Result<CourseNote, sqlx::Error> {
    let file_size = i32::try_from(params.pdf_data.len()).unwrap_or(i32::MAX);
    sqlx::query_as::<_, CourseNote>(&format!(
        "INSERT INTO course_notes (
            id, course_id, title, description, pdf_data, file_size, uploaded_by,
            is_active, download_count, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,TRUE,0,$8,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.pdf_data)
    .bind(file_size)
    .bind(params.uploaded_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateNote {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) pdf_data: Option<Vec<u8>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateNote,
) -> Result<Option<CourseNote>, sqlx::Error> {
    let file_size = params
        .pdf_data
        .as_ref()
        .map(|data| i32::try_from(data.len()).unwrap_or(i32::MAX));
    sqlx::query_as::<_, CourseNote>(&format!(
        "UPDATE course_notes SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            is_active = COALESCE($3, is_active),
            pdf_data = COALESCE($4, pdf_data),
            file_size = COALESCE($5, file_size),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.is_active)
    .bind(params.pdf_data)
    .bind(file_size)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM course_notes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, FromRow)]
pub(crate) struct NoteDownload {
    pub(crate) title: String,
    pub(crate) pdf_data: Vec<u8>,
}

/// Counts the download and returns the PDF bytes in one statement.
pub(crate) async fn download(pool: &PgPool, id: &str) -> Result<Option<NoteDownload>, sqlx::Error> {
    sqlx::query_as::<_, NoteDownload>(
        "UPDATE course_notes SET download_count = download_count + 1
         WHERE id = $1 AND is_active = TRUE
         RETURNING title, pdf_data",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
