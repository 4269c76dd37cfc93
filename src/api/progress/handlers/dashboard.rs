use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::progress::{
    BundleProgressResponse, CourseProgressResponse, DashboardResponse, GoalResponse,
    StreakResponse,
};
use crate::services::progress;

use super::super::helpers;

pub(in crate::api::progress) async fn dashboard(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let course_rows = helpers::recompute_enrolled(&state, &user).await?;

    let bundles = repositories::bundles::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list bundles"))?;
    let mut bundle_rows = Vec::with_capacity(bundles.len());
    for bundle in &bundles {
        let row = progress::recompute_bundle(state.db(), &user.id, &bundle.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to compute bundle progress"))?;
        bundle_rows.push(row);
    }

    let study_streak = repositories::progress::find_streak(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load study streak"))?
        .map(StreakResponse::from_db)
        .unwrap_or_default();
    let goals = repositories::progress::list_goals(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list learning goals"))?;
    let total_certificates =
        repositories::certificates::count_valid_for_user(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count certificates"))?;
    let total_study_time_seconds = repositories::progress::total_time_spent(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sum study time"))?;

    let total_courses_enrolled = course_rows.len();
    let total_courses_completed = course_rows.iter().filter(|row| row.is_completed).count();

    Ok(Json(DashboardResponse {
        course_progress: course_rows.into_iter().map(CourseProgressResponse::from_db).collect(),
        bundle_progress: bundle_rows.into_iter().map(BundleProgressResponse::from_db).collect(),
        study_streak,
        learning_goals: goals.into_iter().map(GoalResponse::from_db).collect(),
        total_courses_enrolled,
        total_courses_completed,
        total_certificates,
        total_study_time_seconds,
    }))
}
