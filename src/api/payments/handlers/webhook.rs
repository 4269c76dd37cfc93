use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::api::errors::ApiError;
use crate::core::metrics::PAYMENTS_FAILED;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::PaymentStatus;
use crate::repositories;
use crate::schemas::payment::{WebhookAck, WebhookEvent, WebhookPaymentEntity};
use crate::services::enrollment;

const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Razorpay server-to-server events. Unknown events are acknowledged so the
/// gateway stops retrying them.
pub(in crate::api::payments) async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let razorpay = state.razorpay();
    if razorpay.webhook_secret_configured() {
        let signature =
            headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok()).unwrap_or_default();
        if !razorpay.verify_webhook_signature(&body, signature) {
            tracing::warn!("Rejected Razorpay webhook with invalid signature");
            return Err(ApiError::bad_request("Invalid webhook signature"));
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Invalid webhook payload"))?;
    let entity = event.payload.payment.map(|wrapper| wrapper.entity);

    match (event.event.as_str(), entity) {
        ("payment.captured", Some(entity)) => handle_captured(&state, &entity).await?,
        ("payment.failed", Some(entity)) => handle_failed(&state, &entity).await?,
        (other, _) => tracing::debug!(event = other, "Ignoring Razorpay webhook event"),
    }

    Ok(Json(WebhookAck { status: "ok" }))
}

async fn handle_captured(state: &AppState, entity: &WebhookPaymentEntity) -> Result<(), ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let Some(payment) = repositories::payments::lock_by_order(&mut *tx, &entity.order_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch payment"))?
    else {
        tracing::warn!(order_id = %entity.order_id, "Captured webhook for unknown order");
        return Ok(());
    };
    if payment.status != PaymentStatus::Pending {
        return Ok(());
    }

    let buyer = repositories::users::find_by_id(state.db(), &payment.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch buyer"))?
        .ok_or_else(|| ApiError::Internal("Payment buyer no longer exists".to_string()))?;

    let completed = enrollment::complete_payment(
        &mut tx,
        &payment,
        &buyer,
        &entity.id,
        None,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete payment"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit payment"))?;

    tracing::info!(payment_id = %completed.payment.id, order_id = %entity.order_id, "Payment captured via webhook");
    enrollment::send_confirmation(state, &buyer, &completed);
    Ok(())
}

async fn handle_failed(state: &AppState, entity: &WebhookPaymentEntity) -> Result<(), ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let Some(payment) = repositories::payments::lock_by_order(&mut *tx, &entity.order_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch payment"))?
    else {
        tracing::warn!(order_id = %entity.order_id, "Failed webhook for unknown order");
        return Ok(());
    };
    if repositories::payments::is_terminal(payment.status) {
        return Ok(());
    }

    let reason = entity.error_description.as_deref().unwrap_or("Payment failed");
    repositories::payments::mark_failed(
        &mut *tx,
        &payment.id,
        Some(&entity.id),
        reason,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update payment"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit payment"))?;

    metrics::counter!(PAYMENTS_FAILED).increment(1);
    tracing::info!(payment_id = %payment.id, reason, "Payment failed via webhook");
    Ok(())
}
