use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::certificate::{TemplateCreate, TemplateResponse};

pub(in crate::api::certificates) async fn list_templates(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateResponse>>, ApiError> {
    let templates = repositories::certificates::list_active_templates(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificate templates"))?;
    Ok(Json(templates.into_iter().map(TemplateResponse::from_db).collect()))
}

pub(in crate::api::certificates) async fn create_template(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TemplateCreate>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !payload.layout_svg.contains("{{qr_code}}") {
        return Err(ApiError::bad_request("layout_svg must contain the {{qr_code}} placeholder"));
    }

    let template = repositories::certificates::create_template(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        &payload.description,
        &payload.layout_svg,
        payload.is_active,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create certificate template"))?;

    tracing::info!(template_id = %template.id, admin_id = %admin.id, "Certificate template created");
    Ok((StatusCode::CREATED, Json(TemplateResponse::from_db(template))))
}
