use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Notification, User};
use crate::repositories;

pub(super) const NOTIFICATION_NOT_FOUND: &str = "Notification not found";
pub(super) const TEMPLATE_NOT_FOUND: &str = "Notification template not found";
pub(super) const BULK_NOT_FOUND: &str = "Bulk notification not found";

/// Admins reach every notification; everyone else only their own.
pub(super) async fn fetch_visible(
    state: &AppState,
    user: &User,
    notification_id: &str,
) -> Result<Notification, ApiError> {
    repositories::notifications::find_by_id(state.db(), notification_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch notification"))?
        .filter(|notification| user.is_admin() || notification.recipient_id == user.id)
        .ok_or_else(|| ApiError::not_found(NOTIFICATION_NOT_FOUND))
}
