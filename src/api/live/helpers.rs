use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{LiveClass, User};
use crate::repositories;

pub(super) const CLASS_NOT_FOUND: &str = "Live class not found";

/// Applies due status transitions before a read so clients never see a
/// stale status between scheduler ticks.
pub(super) async fn sync_statuses(state: &AppState) -> Result<(), ApiError> {
    crate::tasks::scheduler::sync_live_statuses(state)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sync live class statuses"))?;
    Ok(())
}

pub(super) async fn fetch_class(state: &AppState, class_id: &str) -> Result<LiveClass, ApiError> {
    repositories::live_classes::find_by_id(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch live class"))?
        .ok_or_else(|| ApiError::not_found(CLASS_NOT_FOUND))
}

/// `None` for admins, the actively enrolled course ids otherwise.
pub(super) async fn visible_course_ids(
    state: &AppState,
    user: &User,
) -> Result<Option<Vec<String>>, ApiError> {
    if user.is_admin() {
        return Ok(None);
    }

    repositories::enrollments::active_course_ids(state.db(), &user.id)
        .await
        .map(Some)
        .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))
}
