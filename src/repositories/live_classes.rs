use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{LiveClass, LiveClassAttendance};
use crate::db::types::LiveClassStatus;

const COLUMNS: &str = "\
    id, course_id, title, description, instructor, scheduled_start, scheduled_end, platform, \
    meeting_id, meeting_url, status, max_participants, recording_url, created_by, \
    created_at, updated_at";
const ATTENDANCE_COLUMNS: &str =
    "id, live_class_id, student_id, joined_at, left_at, duration_minutes";

pub(crate) struct CreateLiveClass<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) instructor: &'a str,
    pub(crate) scheduled_start: PrimitiveDateTime,
    pub(crate) scheduled_end: PrimitiveDateTime,
    pub(crate) meeting_id: &'a str,
    pub(crate) meeting_url: &'a str,
    pub(crate) max_participants: i32,
    pub(crate) created_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateLiveClass<'_>,
) -> Result<LiveClass, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "INSERT INTO live_classes (
            id, course_id, title, description, instructor, scheduled_start, scheduled_end,
            platform, meeting_id, meeting_url, status, max_participants, created_by,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,'jitsi',$8,$9,'scheduled',$10,$11,$12,$12)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructor)
    .bind(params.scheduled_start)
    .bind(params.scheduled_end)
    .bind(params.meeting_id)
    .bind(params.meeting_url)
    .bind(params.max_participants)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// All classes, or only those of `course_ids` when given.
pub(crate) async fn list(
    pool: &PgPool,
    course_ids: Option<&[String]>,
) -> Result<Vec<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "SELECT {COLUMNS} FROM live_classes
         WHERE $1::text[] IS NULL OR course_id = ANY($1)
         ORDER BY scheduled_start DESC"
    ))
    .bind(course_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_upcoming(
    pool: &PgPool,
    course_ids: Option<&[String]>,
    now: PrimitiveDateTime,
) -> Result<Vec<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "SELECT {COLUMNS} FROM live_classes
         WHERE status = 'scheduled'
           AND scheduled_start > $1
           AND ($2::text[] IS NULL OR course_id = ANY($2))
         ORDER BY scheduled_start"
    ))
    .bind(now)
    .bind(course_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "SELECT {COLUMNS} FROM live_classes WHERE course_id = $1 ORDER BY scheduled_start"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!("SELECT {COLUMNS} FROM live_classes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct UpdateLiveClass {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) instructor: Option<String>,
    pub(crate) scheduled_start: Option<PrimitiveDateTime>,
    pub(crate) scheduled_end: Option<PrimitiveDateTime>,
    pub(crate) max_participants: Option<i32>,
    pub(crate) status: Option<LiveClassStatus>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateLiveClass,
) -> Result<Option<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "UPDATE live_classes SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            instructor = COALESCE($3, instructor),
            scheduled_start = COALESCE($4, scheduled_start),
            scheduled_end = COALESCE($5, scheduled_end),
            max_participants = COALESCE($6, max_participants),
            status = COALESCE($7, status),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructor)
    .bind(params.scheduled_start)
    .bind(params.scheduled_end)
    .bind(params.max_participants)
    .bind(params.status)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_status(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: LiveClassStatus,
    now: PrimitiveDateTime,
) -> Result<Option<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "UPDATE live_classes SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn set_recording(
    pool: &PgPool,
    id: &str,
    recording_url: &str,
    now: PrimitiveDateTime,
) -> Result<Option<LiveClass>, sqlx::Error> {
    sqlx::query_as::<_, LiveClass>(&format!(
        "UPDATE live_classes SET recording_url = $1, updated_at = $2 WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(recording_url)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM live_classes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Applies the time-driven status transitions and returns how many rows
/// moved. Cancelled classes are never touched.
pub(crate) async fn sync_statuses(pool: &PgPool, now: PrimitiveDateTime) -> Result<u64, sqlx::Error> {
    let started = sqlx::query(
        "UPDATE live_classes SET status = 'live', updated_at = $1
         WHERE status = 'scheduled' AND scheduled_start <= $1 AND scheduled_end > $1",
    )
    .bind(now)
    .execute(pool)
    .await?;

    let finished = sqlx::query(
        "UPDATE live_classes SET status = 'completed', updated_at = $1
         WHERE status IN ('scheduled', 'live') AND scheduled_end <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(started.rows_affected() + finished.rows_affected())
}

/// Creates the attendance row or re-stamps `joined_at` on a rejoin.
pub(crate) async fn join(
    pool: &PgPool,
    id: &str,
    live_class_id: &str,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<LiveClassAttendance, sqlx::Error> {
    sqlx::query_as::<_, LiveClassAttendance>(&format!(
        "INSERT INTO live_class_attendance (id, live_class_id, student_id, joined_at, duration_minutes)
         VALUES ($1, $2, $3, $4, 0)
         ON CONFLICT (live_class_id, student_id) DO UPDATE
             SET joined_at = EXCLUDED.joined_at, left_at = NULL
         RETURNING {ATTENDANCE_COLUMNS}",
    ))
    .bind(id)
    .bind(live_class_id)
    .bind(student_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn leave(
    pool: &PgPool,
    live_class_id: &str,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<LiveClassAttendance>, sqlx::Error> {
    sqlx::query_as::<_, LiveClassAttendance>(&format!(
        "UPDATE live_class_attendance SET
            left_at = $1,
            duration_minutes = GREATEST(0, FLOOR(EXTRACT(EPOCH FROM ($1 - joined_at)) / 60))::int
         WHERE live_class_id = $2 AND student_id = $3
         RETURNING {ATTENDANCE_COLUMNS}",
    ))
    .bind(now)
    .bind(live_class_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Stamps `left_at` on every still-open attendance when a class ends.
pub(crate) async fn close_open_attendance(
    executor: impl sqlx::PgExecutor<'_>,
    live_class_id: &str,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE live_class_attendance SET
            left_at = $1,
            duration_minutes = GREATEST(0, FLOOR(EXTRACT(EPOCH FROM ($1 - joined_at)) / 60))::int
         WHERE live_class_id = $2 AND left_at IS NULL",
    )
    .bind(now)
    .bind(live_class_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, FromRow)]
pub(crate) struct AttendeeRow {
    #[sqlx(flatten)]
    pub(crate) attendance: LiveClassAttendance,
    pub(crate) username: String,
    pub(crate) email: String,
}

pub(crate) async fn list_attendees(
    pool: &PgPool,
    live_class_id: &str,
) -> Result<Vec<AttendeeRow>, sqlx::Error> {
    sqlx::query_as::<_, AttendeeRow>(
        "SELECT a.id, a.live_class_id, a.student_id, a.joined_at, a.left_at, a.duration_minutes,
                u.username, u.email
         FROM live_class_attendance a
         JOIN users u ON u.id = a.student_id
         WHERE a.live_class_id = $1
         ORDER BY a.joined_at",
    )
    .bind(live_class_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct AttendanceWithClass {
    #[sqlx(flatten)]
    pub(crate) attendance: LiveClassAttendance,
    pub(crate) class_title: String,
    pub(crate) course_id: String,
}

pub(crate) async fn attendance_history(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<AttendanceWithClass>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceWithClass>(
        "SELECT a.id, a.live_class_id, a.student_id, a.joined_at, a.left_at, a.duration_minutes,
                lc.title AS class_title, lc.course_id
         FROM live_class_attendance a
         JOIN live_classes lc ON lc.id = a.live_class_id
         WHERE a.student_id = $1
         ORDER BY a.joined_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
