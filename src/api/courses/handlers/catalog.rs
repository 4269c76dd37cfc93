use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::MaybeUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::courses::CourseFilter;
use crate::schemas::course::{
    CategoryResponse, CategorySummary, CourseDetailResponse, CourseListQuery, CourseNameSlug,
    CourseResponse,
};

use super::super::helpers;

pub(in crate::api::courses) async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repositories::categories::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list categories"))?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from_db).collect()))
}

pub(in crate::api::courses) async fn programming_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let categories = repositories::categories::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list categories"))?;

    Ok(Json(
        categories
            .into_iter()
            .map(|category| CategorySummary {
                id: category.id,
                name: category.name,
                slug: category.slug,
            })
            .collect(),
    ))
}

pub(in crate::api::courses) async fn name_slugs(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseNameSlug>>, ApiError> {
    let rows = repositories::courses::published_name_slugs(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(
        rows.into_iter().map(|(id, title, slug)| CourseNameSlug { id, title, slug }).collect(),
    ))
}

pub(in crate::api::courses) async fn list_courses(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    Query(params): Query<CourseListQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let filter = CourseFilter {
        is_published: Some(true),
        category: params.category,
        difficulty_level: params.difficulty_level,
        search: params.search,
        ordering: params.ordering,
    };
    let courses = repositories::courses::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    let enrolled = helpers::enrolled_course_ids(&state, user.as_ref()).await?;

    Ok(Json(
        courses
            .into_iter()
            .map(|course| {
                let is_enrolled = enrolled.contains(&course.id);
                CourseResponse::from_db(course).with_enrolled(is_enrolled)
            })
            .collect(),
    ))
}

pub(in crate::api::courses) async fn get_course(
    Path(course_key): Path<String>,
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = helpers::fetch_course(&state, &course_key).await?;
    let is_admin = user.as_ref().is_some_and(|user| user.is_admin());
    if !course.is_published && !is_admin {
        return Err(ApiError::not_found(helpers::COURSE_NOT_FOUND));
    }

    let enrolled = helpers::enrolled_course_ids(&state, user.as_ref())
        .await?
        .contains(&course.id);

    let detail = helpers::course_detail(&state, course, enrolled || is_admin, Some(enrolled)).await?;
    Ok(Json(detail))
}
