use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{CourseProgress, User};
use crate::repositories;
use crate::services::progress;

pub(super) const NOT_ENROLLED: &str = "You are not enrolled in this course";

/// Fresh progress rows for every course the user is actively enrolled in.
pub(super) async fn recompute_enrolled(
    state: &AppState,
    user: &User,
) -> Result<Vec<CourseProgress>, ApiError> {
    let course_ids = repositories::enrollments::active_course_ids(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))?;

    let mut rows = Vec::with_capacity(course_ids.len());
    for course_id in &course_ids {
        let row = progress::recompute_course(state.db(), &user.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to compute course progress"))?;
        rows.push(row);
    }
    Ok(rows)
}
