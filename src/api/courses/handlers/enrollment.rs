use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{
    BundleCreate, BundleResponse, CourseResponse, EnrollRequest, EnrollResponse,
    EnrollmentResponse, MyCourseResponse, ReviewCreate, ReviewResponse,
};
use crate::services::enrollment::enroll_in_course;
use crate::services::pricing::bundle_pricing;

use super::super::helpers;

pub(in crate::api::courses) async fn enroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollResponse>), ApiError> {
    let course = repositories::courses::find_by_id(state.db(), payload.course.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .filter(|course| course.is_published)
        .ok_or_else(|| ApiError::not_found(helpers::COURSE_NOT_FOUND))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let outcome = enroll_in_course(&mut tx, &user.id, &course, None, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to enroll"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit enrollment"))?;

    let (status, message) = if outcome.created {
        tracing::info!(user_id = %user.id, course_id = %course.id, "Student enrolled");
        (StatusCode::CREATED, "Successfully enrolled in course")
    } else {
        (StatusCode::OK, "Already enrolled in this course")
    };

    Ok((
        status,
        Json(EnrollResponse {
            message: message.to_string(),
            enrollment: EnrollmentResponse::from_db(outcome.enrollment),
        }),
    ))
}

pub(in crate::api::courses) async fn my_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyCourseResponse>>, ApiError> {
    let enrollments = repositories::enrollments::list_active_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))?;

    let course_ids: Vec<String> =
        enrollments.iter().map(|enrollment| enrollment.course_id.clone()).collect();
    let mut courses: HashMap<String, _> = repositories::courses::find_many(state.db(), &course_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load courses"))?
        .into_iter()
        .map(|course| (course.id.clone(), course))
        .collect();

    let items = enrollments
        .into_iter()
        .filter_map(|enrollment| {
            let course = courses.remove(&enrollment.course_id)?;
            Some(MyCourseResponse {
                enrollment: EnrollmentResponse::from_db(enrollment),
                course: CourseResponse::from_db(course).with_enrolled(true),
            })
        })
        .collect();

    Ok(Json(items))
}

pub(in crate::api::courses) async fn list_reviews(
    Path(course_key): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let course = helpers::fetch_course(&state, &course_key).await?;
    let reviews = repositories::reviews::list_for_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list reviews"))?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from_db).collect()))
}

pub(in crate::api::courses) async fn create_review(
    Path(course_key): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let course = helpers::fetch_course(&state, &course_key).await?;
    let now = primitive_now_utc();

    let review = repositories::reviews::create(
        state.db(),
        repositories::reviews::CreateReview {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            student_id: &user.id,
            rating: payload.rating,
            comment: payload.comment.trim(),
            now,
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("You have already reviewed this course".to_string())
        } else {
            ApiError::internal(e, "Failed to create review")
        }
    })?;

    repositories::courses::refresh_rating(state.db(), &course.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to refresh course rating"))?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from_db(review))))
}

pub(in crate::api::courses) async fn list_bundles(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BundleResponse>>, ApiError> {
    let bundles = repositories::bundles::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list bundles"))?;

    let mut items = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        let course_ids = repositories::bundles::course_ids(state.db(), &bundle.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load bundle courses"))?;
        let courses = repositories::courses::find_many(state.db(), &course_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load bundle courses"))?;
        items.push(BundleResponse::from_db(bundle, courses));
    }

    Ok(Json(items))
}

pub(in crate::api::courses) async fn create_bundle(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<BundleCreate>,
) -> Result<(StatusCode, Json<BundleResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut course_ids = payload.courses.clone();
    course_ids.sort();
    course_ids.dedup();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let courses = repositories::courses::find_many(&mut *tx, &course_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load courses"))?;
    if courses.len() != course_ids.len() || courses.iter().any(|course| !course.is_published) {
        return Err(ApiError::bad_request("One or more courses do not exist"));
    }

    let prices: Vec<_> = courses.iter().map(|course| course.effective_price()).collect();
    let pricing = bundle_pricing(&prices);

    let bundle = repositories::bundles::create(
        &mut tx,
        repositories::bundles::CreateBundle {
            id: &Uuid::new_v4().to_string(),
            student_id: &user.id,
            name: payload.name.trim(),
            total_price: pricing.total_price,
            discount_percentage: pricing.discount_percentage,
            final_price: pricing.final_price,
            course_ids: &course_ids,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create bundle"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit bundle"))?;

    Ok((StatusCode::CREATED, Json(BundleResponse::from_db(bundle, courses))))
}
