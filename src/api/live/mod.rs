mod handlers;
mod helpers;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/live-classes", get(handlers::list_classes))
        .route("/live-classes/create", post(handlers::create_class))
        .route("/live-classes/upcoming", get(handlers::upcoming_classes))
        .route(
            "/live-classes/:class_id",
            get(handlers::get_class).patch(handlers::update_class),
        )
        .route("/live-classes/:class_id/join", post(handlers::join_class))
        .route("/live-classes/:class_id/leave", post(handlers::leave_class))
        .route("/live-classes/:class_id/status", get(handlers::class_status))
        .route("/live-classes/:class_id/start", post(handlers::start_class))
        .route("/live-classes/:class_id/end", post(handlers::end_class))
        .route("/live-classes/:class_id/stop-delete", delete(handlers::stop_and_delete))
        .route("/live-classes/:class_id/save-recording", post(handlers::save_recording))
        .route("/live-classes/:class_id/recording", get(handlers::get_recording))
        .route("/live-classes/:class_id/attendees", get(handlers::list_attendees))
        .route("/live-classes/:class_id/send-reminder", post(handlers::send_reminder))
        .route("/attendance/history", get(handlers::attendance_history))
        .route("/courses/:course_id/live-classes", get(handlers::course_classes))
}

#[cfg(test)]
mod tests;
