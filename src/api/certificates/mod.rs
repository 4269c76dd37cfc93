mod handlers;
mod helpers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(handlers::list_certificates))
        .route("/certificates/:certificate_id", get(handlers::get_certificate))
        .route("/certificates/generate/course/:course_id", post(handlers::generate_course))
        .route("/certificates/generate/bundle/:bundle_id", post(handlers::generate_bundle))
        .route("/certificates/verify/:certificate_id", get(handlers::verify_certificate))
        .route("/certificates/download/:certificate_id", get(handlers::download_certificate))
        .route("/certificates/share/:certificate_id", post(handlers::share_certificate))
        .route(
            "/certificate-templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
}

#[cfg(test)]
mod tests;
