use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::courses::CourseFilter;
use crate::schemas::course::{
    AdminCourseQuery, BulkOperationRequest, BulkOperationResponse, CategoryCreate,
    CategoryResponse, CourseCreate, CourseDetailResponse, CourseResponse, CourseUpdate,
    LessonCreate, LessonResponse, ResourceCreate, ResourceResponse, SectionCreate,
    SectionResponse,
};
use crate::services::slugs::unique_slug;

use super::super::helpers;

pub(in crate::api::courses) async fn create_category(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let name = payload.name.trim();
    let slug = unique_slug(name, |candidate| {
        let pool = state.db().clone();
        async move { repositories::categories::slug_taken(&pool, &candidate).await }
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to generate category slug"))?;

    let category = repositories::categories::create(
        state.db(),
        repositories::categories::CreateCategory {
            id: &Uuid::new_v4().to_string(),
            name,
            slug: &slug,
            description: &payload.description,
            icon: &payload.icon,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Category with this name already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create category")
        }
    })?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from_db(category))))
}

pub(in crate::api::courses) async fn create_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_prices(Some(payload.price), payload.discounted_price)?;

    let category = helpers::category_by_name(&state, &payload.category).await?;
    let title = payload.title.trim();
    let slug = unique_slug(title, |candidate| {
        let pool = state.db().clone();
        async move { repositories::courses::slug_taken(&pool, &candidate).await }
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to generate course slug"))?;

    let instructor = payload
        .instructor
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| admin.full_name());

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            category_id: &category.id,
            title,
            slug: &slug,
            description: &payload.description,
            instructor: &instructor,
            price: payload.price,
            discounted_price: payload.discounted_price,
            duration_hours: payload.duration_hours,
            difficulty_level: payload.difficulty_level,
            prerequisites: &payload.prerequisites,
            what_you_learn: payload.what_you_learn,
            requirements: payload.requirements,
            is_published: payload.is_published,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(course_id = %course.id, admin_id = %admin.id, "Course created");
    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

pub(in crate::api::courses) async fn update_course(
    Path(course_key): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let course = helpers::fetch_course(&state, &course_key).await?;

    validate_prices(
        Some(payload.price.unwrap_or(course.price)),
        payload.discounted_price.or(course.discounted_price),
    )?;

    let category_id = match payload.category.as_deref() {
        Some(name) => Some(helpers::category_by_name(&state, name).await?.id),
        None => None,
    };

    let updated = repositories::courses::update(
        state.db(),
        &course.id,
        repositories::courses::UpdateCourse {
            category_id,
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            instructor: payload.instructor,
            price: payload.price,
            discounted_price: payload.discounted_price,
            duration_hours: payload.duration_hours,
            difficulty_level: payload.difficulty_level,
            prerequisites: payload.prerequisites,
            what_you_learn: payload.what_you_learn,
            requirements: payload.requirements,
            is_published: payload.is_published,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    Ok(Json(CourseResponse::from_db(updated)))
}

pub(in crate::api::courses) async fn delete_course(
    Path(course_key): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let course = helpers::fetch_course(&state, &course_key).await?;
    let ids = vec![course.id.clone()];

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let active = repositories::enrollments::count_active_for_courses(&mut *tx, &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
    if active > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot delete course with {active} active enrollments"
        )));
    }

    repositories::courses::delete_many(&mut *tx, &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit course delete"))?;

    tracing::info!(course_id = %course.id, admin_id = %admin.id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::courses) async fn add_section(
    Path(course_key): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SectionCreate>,
) -> Result<(StatusCode, Json<SectionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let course = helpers::fetch_course(&state, &course_key).await?;

    let section = repositories::course_content::create_section(
        state.db(),
        repositories::course_content::CreateSection {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            title: payload.title.trim(),
            description: &payload.description,
            sort_order: payload.sort_order,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create section"))?;

    Ok((StatusCode::CREATED, Json(SectionResponse::from_db(section, Vec::new()))))
}

pub(in crate::api::courses) async fn add_lesson(
    Path(section_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<LessonCreate>,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section = repositories::course_content::find_section(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::not_found("Section not found"))?;

    let lesson = repositories::course_content::create_lesson(
        state.db(),
        repositories::course_content::CreateLesson {
            id: &Uuid::new_v4().to_string(),
            section_id: &section.id,
            title: payload.title.trim(),
            content: &payload.content,
            video_url: payload.video_url.as_deref(),
            video_duration_seconds: payload.video_duration_seconds,
            lesson_type: payload.lesson_type,
            sort_order: payload.sort_order,
            is_free: payload.is_free,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create lesson"))?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from_db(lesson, true))))
}

pub(in crate::api::courses) async fn add_resource(
    Path(course_key): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ResourceCreate>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let course = helpers::fetch_course(&state, &course_key).await?;

    let resource = repositories::course_content::create_resource(
        state.db(),
        repositories::course_content::CreateResource {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            title: payload.title.trim(),
            resource_type: payload.resource_type,
            url: &payload.url,
            description: &payload.description,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create resource"))?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from_db(resource))))
}

pub(in crate::api::courses) async fn admin_list_courses(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<AdminCourseQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let filter = CourseFilter {
        is_published: params.is_published,
        category: params.category,
        difficulty_level: None,
        search: params.search,
        ordering: params.ordering,
    };
    let courses = repositories::courses::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

pub(in crate::api::courses) async fn admin_get_course(
    Path(course_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = helpers::fetch_course(&state, &course_id).await?;
    let detail = helpers::course_detail(&state, course, true, None).await?;
    Ok(Json(detail))
}

pub(in crate::api::courses) async fn bulk_operations(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<BulkOperationRequest>,
) -> Result<Json<BulkOperationResponse>, ApiError> {
    if payload.course_ids.is_empty() {
        return Err(ApiError::bad_request("No course IDs provided"));
    }

    let now = primitive_now_utc();
    let (verb, affected) = match payload.action.as_str() {
        "delete" => {
            let mut tx = state
                .db()
                .begin()
                .await
                .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
            let active =
                repositories::enrollments::count_active_for_courses(&mut *tx, &payload.course_ids)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
            if active > 0 {
                return Err(ApiError::bad_request("Cannot delete courses with active enrollments"));
            }
            let deleted = repositories::courses::delete_many(&mut *tx, &payload.course_ids)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to delete courses"))?;
            tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit bulk delete"))?;
            ("deleted", deleted)
        }
        "publish" | "unpublish" => {
            let publish = payload.action == "publish";
            let updated =
                repositories::courses::set_published(state.db(), &payload.course_ids, publish, now)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to update courses"))?;
            (if publish { "published" } else { "unpublished" }, updated)
        }
        _ => return Err(ApiError::bad_request("Invalid action")),
    };

    tracing::info!(admin_id = %admin.id, action = %payload.action, affected, "Bulk course operation");
    Ok(Json(BulkOperationResponse {
        message: format!("Successfully {verb} {affected} courses"),
        affected,
    }))
}

fn validate_prices(
    price: Option<rust_decimal::Decimal>,
    discounted_price: Option<rust_decimal::Decimal>,
) -> Result<(), ApiError> {
    if price.is_some_and(|price| price.is_sign_negative()) {
        return Err(ApiError::bad_request("price must be non-negative"));
    }
    if let (Some(price), Some(discounted)) = (price, discounted_price) {
        if discounted.is_sign_negative() || discounted > price {
            return Err(ApiError::bad_request(
                "discounted_price must be between 0 and price",
            ));
        }
    }
    Ok(())
}
