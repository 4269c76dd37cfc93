use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentUser, MaybeUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::certificate::{CertificateResponse, ShareRequest, VerificationResponse};
use crate::schemas::MessageResponse;
use crate::services::mailer;

use super::super::helpers;

pub(in crate::api::certificates) async fn list_certificates(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let certificates = repositories::certificates::list_valid_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;
    Ok(Json(certificates.into_iter().map(CertificateResponse::from_db).collect()))
}

pub(in crate::api::certificates) async fn get_certificate(
    Path(certificate_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let certificate =
        repositories::certificates::find_for_user(state.db(), &certificate_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch certificate"))?
            .filter(|certificate| certificate.is_valid)
            .ok_or_else(|| ApiError::not_found(helpers::CERTIFICATE_NOT_FOUND))?;
    Ok(Json(CertificateResponse::from_db(certificate)))
}

pub(in crate::api::certificates) async fn verify_certificate(
    Path(certificate_id): Path<String>,
    MaybeUser(viewer): MaybeUser,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<VerificationResponse>), ApiError> {
    let Some(certificate) = repositories::certificates::find_valid(state.db(), &certificate_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch certificate"))?
    else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(VerificationResponse {
                valid: false,
                certificate: None,
                message: Some("Certificate not found or invalid"),
            }),
        ));
    };

    let ip_address = helpers::client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let user_agent =
        headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok()).unwrap_or("");
    repositories::certificates::record_verification(
        state.db(),
        &Uuid::new_v4().to_string(),
        &certificate.id,
        ip_address.as_deref(),
        user_agent,
        viewer.as_ref().map(|user| user.id.as_str()),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record verification"))?;

    tracing::info!(
        certificate_id = %certificate.id,
        ip = ip_address.as_deref().unwrap_or("-"),
        "Certificate verified"
    );

    Ok((
        StatusCode::OK,
        Json(VerificationResponse {
            valid: true,
            certificate: Some(CertificateResponse::from_db(certificate)),
            message: None,
        }),
    ))
}

pub(in crate::api::certificates) async fn download_certificate(
    Path(certificate_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let record = repositories::certificates::file_for_user(state.db(), &certificate_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch certificate file"))?
        .ok_or_else(|| ApiError::not_found(helpers::CERTIFICATE_NOT_FOUND))?;
    let Some(file) = record.certificate_file else {
        return Err(ApiError::not_found("Certificate file not available"));
    };

    let disposition =
        format!("attachment; filename=\"certificate_{}.svg\"", record.certificate_number);
    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file,
    )
        .into_response())
}

pub(in crate::api::certificates) async fn share_certificate(
    Path(certificate_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let certificate =
        repositories::certificates::find_for_user(state.db(), &certificate_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch certificate"))?
            .filter(|certificate| certificate.is_valid)
            .ok_or_else(|| ApiError::not_found(helpers::CERTIFICATE_NOT_FOUND))?;

    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email address required"));
    }
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.mailer().dispatch(mailer::certificate_share_mail(
        email,
        &user.full_name(),
        &certificate.title,
        &certificate.verification_url,
    ));
    tracing::info!(certificate_id = %certificate.id, user_id = %user.id, "Certificate shared");

    Ok(Json(MessageResponse::new("Certificate shared successfully")))
}
