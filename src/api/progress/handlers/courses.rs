use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::progress::{
    BundleProgressResponse, CourseProgressResponse, LessonProgressResponse, LessonProgressUpdate,
    LessonProgressUpdateResponse,
};
use crate::services::progress;

use super::super::helpers;

pub(in crate::api::progress) async fn list_course_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseProgressResponse>>, ApiError> {
    let rows = helpers::recompute_enrolled(&state, &user).await?;
    Ok(Json(rows.into_iter().map(CourseProgressResponse::from_db).collect()))
}

pub(in crate::api::progress) async fn get_course_progress(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseProgressResponse>, ApiError> {
    repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    require_enrollment(&state, &user, &course_id, helpers::NOT_ENROLLED).await?;

    let row = progress::recompute_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute course progress"))?;
    Ok(Json(CourseProgressResponse::from_db(row)))
}

pub(in crate::api::progress) async fn update_lesson_progress(
    Path(lesson_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<LessonProgressUpdate>,
) -> Result<Json<LessonProgressUpdateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(pct) = payload.progress_percentage {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(ApiError::bad_request("progress_percentage must be between 0 and 100"));
        }
    }

    let course_id = repositories::course_content::course_id_for_lesson(state.db(), &lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lesson"))?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;
    require_enrollment(&state, &user, &course_id, helpers::NOT_ENROLLED).await?;

    let lesson_progress = repositories::progress::upsert_lesson(
        state.db(),
        repositories::progress::UpsertLessonProgress {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            lesson_id: &lesson_id,
            is_completed: payload.is_completed,
            watch_time_seconds: payload.watch_time_seconds,
            progress_percentage: payload.progress_percentage,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save lesson progress"))?;

    let course_progress = progress::recompute_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute course progress"))?;
    progress::recompute_bundles_with_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute bundle progress"))?;
    progress::record_study_day(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update study streak"))?;

    tracing::debug!(
        user_id = %user.id,
        lesson_id = %lesson_id,
        completion = %course_progress.completion_percentage,
        "Lesson progress recorded"
    );

    Ok(Json(LessonProgressUpdateResponse {
        lesson_progress: LessonProgressResponse::from_db(lesson_progress),
        course_progress: CourseProgressResponse::from_db(course_progress),
    }))
}

pub(in crate::api::progress) async fn course_lesson_progress(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LessonProgressResponse>>, ApiError> {
    require_enrollment(&state, &user, &course_id, helpers::NOT_ENROLLED).await?;

    let rows = repositories::progress::list_lessons_for_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lesson progress"))?;
    Ok(Json(rows.into_iter().map(LessonProgressResponse::from_db).collect()))
}

pub(in crate::api::progress) async fn get_bundle_progress(
    Path(bundle_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<BundleProgressResponse>, ApiError> {
    let bundle = repositories::bundles::find_for_student(state.db(), &bundle_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bundle"))?
        .ok_or_else(|| ApiError::not_found("Bundle not found"))?;

    let row = progress::recompute_bundle(state.db(), &user.id, &bundle.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute bundle progress"))?;
    Ok(Json(BundleProgressResponse::from_db(row)))
}
