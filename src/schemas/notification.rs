use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::models::{BulkNotification, Notification, NotificationTemplate};
use crate::db::types::{NotificationPriority, NotificationType};

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NotificationCreate {
    /// Recipient user id.
    #[validate(length(min = 1, message = "recipient must not be empty"))]
    pub(crate) recipient: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub(crate) message: String,
    #[serde(default = "default_type")]
    pub(crate) notification_type: NotificationType,
    #[serde(default = "default_priority")]
    pub(crate) priority: NotificationPriority,
    #[serde(default)]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) action_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct NotificationUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) priority: Option<NotificationPriority>,
    #[serde(default)]
    pub(crate) is_read: Option<bool>,
    #[serde(default)]
    pub(crate) action_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) recipient_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) is_read: bool,
    pub(crate) course_id: Option<String>,
    pub(crate) action_url: Option<String>,
    pub(crate) created_at: String,
}

impl NotificationResponse {
    pub(crate) fn from_db(notification: Notification) -> Self {
        Self {
            id: notification.id,
            recipient_id: notification.recipient_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            priority: notification.priority,
            is_read: notification.is_read,
            course_id: notification.course_id,
            action_url: notification.action_url,
            created_at: format_primitive(notification.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UnreadCountResponse {
    pub(crate) unread_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NotificationTemplateCreate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: String,
    pub(crate) notification_type: NotificationType,
    #[validate(length(min = 1, message = "title_template must not be empty"))]
    pub(crate) title_template: String,
    #[validate(length(min = 1, message = "message_template must not be empty"))]
    pub(crate) message_template: String,
    #[serde(default = "default_true")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct NotificationTemplateUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) notification_type: Option<NotificationType>,
    #[serde(default)]
    pub(crate) title_template: Option<String>,
    #[serde(default)]
    pub(crate) message_template: Option<String>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationTemplateResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) title_template: String,
    pub(crate) message_template: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl NotificationTemplateResponse {
    pub(crate) fn from_db(template: NotificationTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name,
            notification_type: template.notification_type,
            title_template: template.title_template,
            message_template: template.message_template,
            is_active: template.is_active,
            created_at: format_primitive(template.created_at),
            updated_at: format_primitive(template.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub(crate) message: String,
    #[serde(default = "default_type")]
    pub(crate) notification_type: NotificationType,
    #[serde(default = "default_priority")]
    pub(crate) priority: NotificationPriority,
    #[serde(default)]
    pub(crate) target_all_users: bool,
    #[serde(default)]
    pub(crate) target_user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) target_all_users: bool,
    pub(crate) target_user_ids: Vec<String>,
    pub(crate) created_by: String,
    pub(crate) sent_at: Option<String>,
    pub(crate) sent_count: i32,
    pub(crate) created_at: String,
}

impl BulkResponse {
    pub(crate) fn from_db(bulk: BulkNotification) -> Self {
        Self {
            id: bulk.id,
            title: bulk.title,
            message: bulk.message,
            notification_type: bulk.notification_type,
            priority: bulk.priority,
            target_all_users: bulk.target_all_users,
            target_user_ids: bulk.target_user_ids.0,
            created_by: bulk.created_by,
            sent_at: bulk.sent_at.map(format_primitive),
            sent_count: bulk.sent_count,
            created_at: format_primitive(bulk.created_at),
        }
    }
}

fn default_type() -> NotificationType {
    NotificationType::General
}

fn default_priority() -> NotificationPriority {
    NotificationPriority::Medium
}

fn default_true() -> bool {
    true
}
