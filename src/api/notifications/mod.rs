mod handlers;
mod helpers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route("/notifications/unread_count", get(handlers::unread_count))
        .route("/notifications/mark_all_read", post(handlers::mark_all_read))
        .route(
            "/notifications/:notification_id",
            get(handlers::get_notification)
                .patch(handlers::update_notification)
                .delete(handlers::delete_notification),
        )
        .route("/notifications/:notification_id/mark_read", post(handlers::mark_read))
        .route("/templates", get(handlers::list_templates).post(handlers::create_template))
        .route(
            "/templates/:template_id",
            get(handlers::get_template)
                .patch(handlers::update_template)
                .delete(handlers::delete_template),
        )
        .route("/bulk", get(handlers::list_bulk).post(handlers::create_bulk))
        .route("/bulk/:bulk_id", get(handlers::get_bulk).delete(handlers::delete_bulk))
        .route("/bulk/:bulk_id/send_notification", post(handlers::send_bulk))
}
