mod handlers;
mod helpers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::core::state::AppState;

/// Multipart overhead allowed on top of the video size limit.
const UPLOAD_BODY_SLACK_BYTES: usize = 1024 * 1024;

pub(crate) fn router(max_video_size_mb: u64) -> Router<AppState> {
    let upload_limit = (max_video_size_mb as usize) * 1024 * 1024 + UPLOAD_BODY_SLACK_BYTES;

    Router::new()
        .route("/categories", get(handlers::list_categories).post(handlers::create_category))
        .route("/course-list", get(handlers::list_courses))
        .route("/programming-languages", get(handlers::programming_languages))
        .route("/name-slugs", get(handlers::name_slugs))
        .route("/courses/create", post(handlers::create_course))
        .route("/courses/:course", get(handlers::get_course))
        .route("/courses/:course/sections", post(handlers::add_section))
        .route("/sections/:section_id/lessons", post(handlers::add_lesson))
        .route("/courses/:course/resources", post(handlers::add_resource))
        .route(
            "/courses/:course/update",
            axum::routing::put(handlers::update_course).patch(handlers::update_course),
        )
        .route("/courses/:course/delete", delete(handlers::delete_course))
        .route(
            "/courses/:course/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route("/enroll", post(handlers::enroll))
        .route("/my-courses", get(handlers::my_courses))
        .route("/bundles", get(handlers::list_bundles).post(handlers::create_bundle))
        .route(
            "/recorded-videos/upload",
            post(handlers::upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/recorded-videos/:course_id", get(handlers::list_videos))
        .route("/admin/courses", get(handlers::admin_list_courses))
        .route("/admin/courses/bulk-operations", post(handlers::bulk_operations))
        .route("/admin/courses/:course_id", get(handlers::admin_get_course))
}
