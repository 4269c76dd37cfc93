use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{BulkNotification, Notification, NotificationTemplate};
use crate::db::types::{NotificationPriority, NotificationType};

const COLUMNS: &str = "\
    id, recipient_id, title, message, notification_type, priority, is_read, course_id, \
    action_url, created_at, updated_at";
const TEMPLATE_COLUMNS: &str = "\
    id, name, notification_type, title_template, message_template, is_active, created_at, updated_at";
const BULK_COLUMNS: &str = "\
    id, title, message, notification_type, priority, target_all_users, target_user_ids, \
    created_by, sent_at, sent_count, created_at, updated_at";

pub(crate) struct NewNotification<'a> {
    pub(crate) recipient_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) message: &'a str,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) action_url: Option<&'a str>,
}

/// Shared payload for a fan-out insert; recipients are passed alongside.
pub(crate) struct NotificationContent<'a> {
    pub(crate) title: &'a str,
    pub(crate) message: &'a str,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) action_url: Option<&'a str>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: NewNotification<'_>,
    now: PrimitiveDateTime,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (
            id, recipient_id, title, message, notification_type, priority, is_read,
            course_id, action_url, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,FALSE,$7,$8,$9,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(params.recipient_id)
    .bind(params.title)
    .bind(params.message)
    .bind(params.notification_type)
    .bind(params.priority)
    .bind(params.course_id)
    .bind(params.action_url)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// One notification per recipient. `ids` and `recipient_ids` are zipped.
pub(crate) async fn create_many(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
    recipient_ids: &[String],
    content: NotificationContent<'_>,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO notifications (
            id, recipient_id, title, message, notification_type, priority, is_read,
            course_id, action_url, created_at, updated_at
         )
         SELECT t.id, t.recipient_id, $3, $4, $5, $6, FALSE, $7, $8, $9, $9
         FROM unnest($1::text[], $2::text[]) AS t(id, recipient_id)",
    )
    .bind(ids)
    .bind(recipient_ids)
    .bind(content.title)
    .bind(content.message)
    .bind(content.notification_type)
    .bind(content.priority)
    .bind(content.course_id)
    .bind(content.action_url)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Page of notifications, newest first. `recipient_id = None` lists all.
pub(crate) async fn list(
    pool: &PgPool,
    recipient_id: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications
         WHERE $1::text IS NULL OR recipient_id = $1
         ORDER BY created_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(recipient_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, recipient_id: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE $1::text IS NULL OR recipient_id = $1",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!("SELECT {COLUMNS} FROM notifications WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct UpdateNotification {
    pub(crate) title: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) priority: Option<NotificationPriority>,
    pub(crate) is_read: Option<bool>,
    pub(crate) action_url: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateNotification,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET
            title = COALESCE($1, title),
            message = COALESCE($2, message),
            priority = COALESCE($3, priority),
            is_read = COALESCE($4, is_read),
            action_url = COALESCE($5, action_url),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.message)
    .bind(params.priority)
    .bind(params.is_read)
    .bind(params.action_url)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn unread_count(pool: &PgPool, recipient_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn mark_all_read(
    pool: &PgPool,
    recipient_id: &str,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE, updated_at = $2
         WHERE recipient_id = $1 AND is_read = FALSE",
    )
    .bind(recipient_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_templates(pool: &PgPool) -> Result<Vec<NotificationTemplate>, sqlx::Error> {
    sqlx::query_as::<_, NotificationTemplate>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM notification_templates ORDER BY name"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_template(
    pool: &PgPool,
    id: &str,
) -> Result<Option<NotificationTemplate>, sqlx::Error> {
    sqlx::query_as::<_, NotificationTemplate>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM notification_templates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateTemplate<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) notification_type: NotificationType,
    pub(crate) title_template: &'a str,
    pub(crate) message_template: &'a str,
    pub(crate) is_active: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_template(
    pool: &PgPool,
    params: CreateTemplate<'_>,
) -> Result<NotificationTemplate, sqlx::Error> {
    sqlx::query_as::<_, NotificationTemplate>(&format!(
        "INSERT INTO notification_templates (
            id, name, notification_type, title_template, message_template, is_active,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {TEMPLATE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.notification_type)
    .bind(params.title_template)
    .bind(params.message_template)
    .bind(params.is_active)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateTemplate {
    pub(crate) name: Option<String>,
    pub(crate) notification_type: Option<NotificationType>,
    pub(crate) title_template: Option<String>,
    pub(crate) message_template: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update_template(
    pool: &PgPool,
    id: &str,
    params: UpdateTemplate,
) -> Result<Option<NotificationTemplate>, sqlx::Error> {
    sqlx::query_as::<_, NotificationTemplate>(&format!(
        "UPDATE notification_templates SET
            name = COALESCE($1, name),
            notification_type = COALESCE($2, notification_type),
            title_template = COALESCE($3, title_template),
            message_template = COALESCE($4, message_template),
            is_active = COALESCE($5, is_active),
            updated_at = $6
         WHERE id = $7
         RETURNING {TEMPLATE_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.notification_type)
    .bind(params.title_template)
    .bind(params.message_template)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_template(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notification_templates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_bulk(pool: &PgPool) -> Result<Vec<BulkNotification>, sqlx::Error> {
    sqlx::query_as::<_, BulkNotification>(&format!(
        "SELECT {BULK_COLUMNS} FROM bulk_notifications ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_bulk(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<BulkNotification>, sqlx::Error> {
    sqlx::query_as::<_, BulkNotification>(&format!(
        "SELECT {BULK_COLUMNS} FROM bulk_notifications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateBulk<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) message: &'a str,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) target_all_users: bool,
    pub(crate) target_user_ids: Vec<String>,
    pub(crate) created_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_bulk(
    pool: &PgPool,
    params: CreateBulk<'_>,
) -> Result<BulkNotification, sqlx::Error> {
    sqlx::query_as::<_, BulkNotification>(&format!(
        "INSERT INTO bulk_notifications (
            id, title, message, notification_type, priority, target_all_users, target_user_ids,
            created_by, sent_count, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,0,$9,$9)
         RETURNING {BULK_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.message)
    .bind(params.notification_type)
    .bind(params.priority)
    .bind(params.target_all_users)
    .bind(Json(params.target_user_ids))
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_bulk(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bulk_notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Claims an unsent bulk notification. `false` means it was already sent.
pub(crate) async fn mark_bulk_sent(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    sent_count: i32,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE bulk_notifications SET sent_at = $1, sent_count = $2, updated_at = $1
         WHERE id = $3 AND sent_at IS NULL",
    )
    .bind(now)
    .bind(sent_count)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
