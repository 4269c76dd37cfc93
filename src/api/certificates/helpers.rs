use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::metrics::CERTIFICATES_ISSUED;
use crate::core::state::AppState;
use crate::core::time::{format_date, primitive_now_utc};
use crate::db::models::{Certificate, User};
use crate::db::types::{CertificateType, NotificationPriority, NotificationType};
use crate::repositories;
use crate::repositories::notifications::NewNotification;
use crate::services::{certificate_render, codes};

pub(super) const CERTIFICATE_NOT_FOUND: &str = "Certificate not found";
const NUMBER_ATTEMPTS: usize = 5;

/// A completed course or bundle a certificate is issued for.
pub(super) struct Achievement<'a> {
    pub(super) certificate_type: CertificateType,
    pub(super) target_id: &'a str,
    pub(super) name: &'a str,
    pub(super) completed_at: Option<PrimitiveDateTime>,
}

impl Achievement<'_> {
    fn kind(&self) -> &'static str {
        match self.certificate_type {
            CertificateType::Bundle => "bundle",
            _ => "course",
        }
    }
}

pub(super) enum Issued {
    Existing(String),
    Created(Certificate),
}

pub(super) async fn issue(
    state: &AppState,
    user: &User,
    achievement: Achievement<'_>,
) -> Result<Issued, ApiError> {
    if let Some(existing) = find_existing(state, user, &achievement).await? {
        return Ok(Issued::Existing(existing.id));
    }

    let template = repositories::certificates::default_template(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load certificate template"))?
        .ok_or_else(|| ApiError::bad_request("No certificate template available"))?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let number = unique_number(state, now.year()).await?;
    let holder = user.full_name();
    let issued_on = format_date(now.date());
    let verification_url =
        format!("{}/certificates/verify/{id}", state.settings().api().frontend_url);
    let title = "Certificate of Completion";
    let description = format!(
        "This certifies that {holder} has successfully completed the {} {}",
        achievement.kind(),
        achievement.name
    );

    let payload = certificate_render::qr_payload(&id, &holder, &issued_on);
    let qr_code = match certificate_render::qr_png(&payload) {
        Ok(png) => Some(png),
        Err(err) => {
            tracing::warn!(certificate_id = %id, error = %err, "Failed to render certificate QR");
            None
        }
    };
    let certificate_file = qr_code.as_deref().and_then(|png| {
        let fields = certificate_render::CertificateFields {
            holder_name: &holder,
            title,
            description: &description,
            certificate_number: &number,
            issue_date: &issued_on,
            verification_url: &verification_url,
        };
        match certificate_render::render_svg(&template.layout_svg, &fields, png) {
            Ok(svg) => Some(svg),
            Err(err) => {
                tracing::warn!(
                    certificate_id = %id,
                    template_id = %template.id,
                    error = %err,
                    "Failed to render certificate file"
                );
                None
            }
        }
    });

    let (course_id, bundle_id) = match achievement.certificate_type {
        CertificateType::Bundle => (None, Some(achievement.target_id)),
        _ => (Some(achievement.target_id), None),
    };

    let created = repositories::certificates::create(
        state.db(),
        repositories::certificates::CreateCertificate {
            id: &id,
            user_id: &user.id,
            certificate_type: achievement.certificate_type,
            course_id,
            bundle_id,
            template_id: &template.id,
            certificate_number: &number,
            title,
            description: &description,
            completion_date: achievement.completed_at.unwrap_or(now),
            verification_url: &verification_url,
            qr_code: qr_code.as_deref(),
            certificate_file: certificate_file.as_deref(),
            now,
        },
    )
    .await;

    let certificate = match created {
        Ok(certificate) => certificate,
        Err(e) if crate::db::is_unique_violation(&e) => {
            // A concurrent request won the race for this achievement.
            return find_existing(state, user, &achievement)
                .await?
                .map(|existing| Issued::Existing(existing.id))
                .ok_or_else(|| ApiError::internal(e, "Failed to create certificate"));
        }
        Err(e) => return Err(ApiError::internal(e, "Failed to create certificate")),
    };

    metrics::counter!(CERTIFICATES_ISSUED).increment(1);
    tracing::info!(
        certificate_id = %certificate.id,
        user_id = %user.id,
        number = %certificate.certificate_number,
        has_file = certificate.has_file,
        "Certificate issued"
    );

    let message = format!(
        "Your certificate for the {} {} is ready.",
        achievement.kind(),
        achievement.name
    );
    let action_url = format!("/certificates/{}", certificate.id);
    if let Err(err) = repositories::notifications::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        NewNotification {
            recipient_id: &user.id,
            title: "Certificate earned",
            message: &message,
            notification_type: NotificationType::Certificate,
            priority: NotificationPriority::Medium,
            course_id,
            action_url: Some(&action_url),
        },
        now,
    )
    .await
    {
        tracing::warn!(
            certificate_id = %certificate.id,
            error = %err,
            "Failed to create certificate notification"
        );
    }

    Ok(Issued::Created(certificate))
}

async fn find_existing(
    state: &AppState,
    user: &User,
    achievement: &Achievement<'_>,
) -> Result<Option<Certificate>, ApiError> {
    repositories::certificates::find_issued(
        state.db(),
        &user.id,
        achievement.certificate_type,
        achievement.target_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to look up certificate"))
}

async fn unique_number(state: &AppState, year: i32) -> Result<String, ApiError> {
    for _ in 0..NUMBER_ATTEMPTS {
        let candidate = codes::generate_certificate_number(year);
        let taken = repositories::certificates::certificate_number_taken(state.db(), &candidate)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check certificate number"))?;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(ApiError::Internal("Failed to allocate certificate number".to_string()))
}

/// First `x-forwarded-for` hop, else the socket peer.
pub(super) fn client_ip(
    headers: &axum::http::HeaderMap,
    peer: Option<std::net::SocketAddr>,
) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let peer = "127.0.0.1:5000".parse().ok();

        assert_eq!(client_ip(&headers, peer).as_deref(), Some("203.0.113.9"));
        assert_eq!(client_ip(&HeaderMap::new(), peer).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
