mod handlers;
mod helpers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/course-progress", get(handlers::list_course_progress))
        .route("/course-progress/:course_id", get(handlers::get_course_progress))
        .route("/lesson-progress/:lesson_id", post(handlers::update_lesson_progress))
        .route("/lesson-progress/course/:course_id", get(handlers::course_lesson_progress))
        .route("/bundle-progress/:bundle_id", get(handlers::get_bundle_progress))
        .route("/dashboard", get(handlers::dashboard))
        .route("/learning-goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/learning-goals/:goal_id",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .patch(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
}
