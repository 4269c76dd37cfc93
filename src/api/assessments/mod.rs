mod handlers;
mod helpers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

/// JSON framing allowed on top of the base64-encoded note.
const NOTE_BODY_SLACK_BYTES: usize = 64 * 1024;

pub(crate) fn router(max_note_size_mb: u64) -> Router<AppState> {
    let raw_limit = (max_note_size_mb as usize) * 1024 * 1024;
    let note_limit = DefaultBodyLimit::max(raw_limit.div_ceil(3) * 4 + NOTE_BODY_SLACK_BYTES);

    Router::new()
        .route("/assessment-list", get(handlers::list_assessments))
        .route("/assessment/create", post(handlers::create_assessment))
        .route("/assessment/submit", post(handlers::submit_assessment))
        .route(
            "/assessment/:assessment_id",
            get(handlers::get_assessment).patch(handlers::update_assessment),
        )
        .route("/assessment/:assessment_id/questions", post(handlers::add_question))
        .route("/assessment/:assessment_id/start", post(handlers::start_assessment))
        .route("/assessment/:assessment_id/results", get(handlers::assessment_results))
        .route("/my-assessments", get(handlers::my_assessments))
        .route(
            "/notes",
            get(handlers::list_notes).post(handlers::create_note).layer(note_limit),
        )
        .route("/notes/upload", post(handlers::create_note).layer(note_limit))
        .route("/notes/by_course", get(handlers::notes_by_course))
        .route(
            "/notes/:note_id",
            get(handlers::get_note)
                .patch(handlers::update_note)
                .delete(handlers::delete_note)
                .layer(note_limit),
        )
        .route("/notes/:note_id/download", get(handlers::download_note))
        .route("/courses/:course_id/notes", get(handlers::course_notes))
}
