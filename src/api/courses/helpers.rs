use std::collections::HashSet;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Category, Course, User};
use crate::repositories;
use crate::schemas::course::{
    CourseDetailResponse, CourseResponse, LessonResponse, ResourceResponse, SectionResponse,
};

pub(super) const COURSE_NOT_FOUND: &str = "Course not found";

/// Course by id or slug, 404 otherwise.
pub(super) async fn fetch_course(state: &AppState, key: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id_or_slug(state.db(), key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found(COURSE_NOT_FOUND))
}

pub(super) async fn category_by_name(state: &AppState, name: &str) -> Result<Category, ApiError> {
    repositories::categories::find_by_name(state.db(), name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch category"))?
        .ok_or_else(|| ApiError::BadRequest(format!("Category \"{}\" does not exist.", name.trim())))
}

/// Ids of courses the user is actively enrolled in. Empty for anonymous.
pub(super) async fn enrolled_course_ids(
    state: &AppState,
    user: Option<&User>,
) -> Result<HashSet<String>, ApiError> {
    let Some(user) = user else {
        return Ok(HashSet::new());
    };

    let ids = repositories::enrollments::active_course_ids(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))?;
    Ok(ids.into_iter().collect())
}

/// Sections with their lessons, plus resources. Lesson bodies are only
/// unlocked for admins and enrolled students.
pub(super) async fn course_detail(
    state: &AppState,
    course: Course,
    unlocked: bool,
    enrolled: Option<bool>,
) -> Result<CourseDetailResponse, ApiError> {
    let sections = repositories::course_content::list_sections(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load sections"))?;
    let lessons = repositories::course_content::list_lessons_for_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lessons"))?;
    let resources = repositories::course_content::list_resources(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load resources"))?;

    let mut lessons_by_section = lessons.into_iter().fold(
        std::collections::HashMap::<String, Vec<LessonResponse>>::new(),
        |mut acc, lesson| {
            acc.entry(lesson.section_id.clone())
                .or_default()
                .push(LessonResponse::from_db(lesson, unlocked));
            acc
        },
    );

    let sections = sections
        .into_iter()
        .map(|section| {
            let lessons = lessons_by_section.remove(&section.id).unwrap_or_default();
            SectionResponse::from_db(section, lessons)
        })
        .collect();

    let mut course = CourseResponse::from_db(course);
    if let Some(enrolled) = enrolled {
        course = course.with_enrolled(enrolled);
    }

    Ok(CourseDetailResponse {
        course,
        sections,
        resources: resources.into_iter().map(ResourceResponse::from_db).collect(),
    })
}
