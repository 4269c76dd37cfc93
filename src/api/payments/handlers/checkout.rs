use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::metrics::PAYMENTS_FAILED;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::PaymentStatus;
use crate::repositories;
use crate::schemas::payment::{
    CouponResponse, CreatePaymentRequest, CreatePaymentResponse, ValidateCouponRequest,
    ValidateCouponResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};
use crate::services::enrollment;
use crate::services::pricing;
use crate::services::razorpay::GatewayError;

use super::super::helpers::{self, PurchaseItem};

pub(in crate::api::payments) async fn create_payment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<CreatePaymentResponse>), ApiError> {
    let item = helpers::resolve_item(
        &state,
        &user,
        payload.course_id.as_deref(),
        payload.bundle_id.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::bad_request("Either course_id or bundle_id is required"))?;

    let amount = item.price();
    let coupon = match payload.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(helpers::usable_coupon(&state, code).await?),
        None => None,
    };
    let discount =
        coupon.as_ref().map(|coupon| pricing::coupon_discount(coupon, amount)).unwrap_or_default();
    let final_amount = pricing::final_amount(amount, discount);

    let payment_id = Uuid::new_v4().to_string();
    let order_id = state
        .razorpay()
        .create_order(pricing::to_paise(final_amount), &payment_id)
        .await
        .map_err(|e| match e {
            GatewayError::NotConfigured => {
                ApiError::ServiceUnavailable("Payment gateway is not configured".to_string())
            }
            other => {
                tracing::error!(error = %other, payment_id = %payment_id, "Gateway order failed");
                ApiError::ServiceUnavailable("Failed to create payment order".to_string())
            }
        })?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    if let Some(coupon) = &coupon {
        let redeemed = repositories::payments::redeem_coupon(&mut *tx, &coupon.id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to redeem coupon"))?;
        if !redeemed {
            return Err(ApiError::bad_request("Coupon is expired or invalid"));
        }
    }

    repositories::payments::create(
        &mut *tx,
        repositories::payments::CreatePayment {
            id: &payment_id,
            user_id: &user.id,
            course_id: item.course_id(),
            bundle_id: item.bundle_id(),
            amount,
            discount_amount: discount,
            final_amount,
            coupon_id: coupon.as_ref().map(|coupon| coupon.id.as_str()),
            payment_method: payload.payment_method,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create payment"))?;

    let payment = repositories::payments::set_gateway_order(&mut *tx, &payment_id, &order_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store gateway order"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit payment"))?;

    tracing::info!(
        payment_id = %payment.id,
        user_id = %user.id,
        order_id = %order_id,
        final_amount = %final_amount,
        "Payment created"
    );

    let (course_title, bundle_title) = match item {
        PurchaseItem::Course { title, .. } => (Some(title), None),
        PurchaseItem::Bundle { name, .. } => (None, Some(name)),
    };

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentResponse {
            payment_db_id: payment.id,
            razorpay_order_id: order_id,
            amount: final_amount,
            original_amount: amount,
            discount_amount: discount,
            currency: "INR",
            key_id: state.razorpay().key_id().to_string(),
            course_title,
            bundle_title,
        }),
    ))
}

pub(in crate::api::payments) async fn verify_payment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<VerifyPaymentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let order_id = payload.razorpay_order_id.trim();
    let gateway_payment_id = payload.razorpay_payment_id.trim();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let payment = repositories::payments::lock_by_order(&mut *tx, order_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch payment"))?
        .filter(|payment| payment.user_id == user.id)
        .ok_or_else(|| ApiError::not_found(helpers::PAYMENT_NOT_FOUND))?;

    match payment.status {
        PaymentStatus::Completed => {
            return Ok((
                StatusCode::OK,
                Json(VerifyPaymentResponse {
                    status: "success",
                    message: "Payment verified successfully",
                    payment_id: Some(payment.id),
                }),
            ));
        }
        PaymentStatus::Refunded => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(VerifyPaymentResponse {
                    status: "refunded",
                    message: "Payment has been refunded",
                    payment_id: Some(payment.id),
                }),
            ));
        }
        _ => {}
    }

    let now = primitive_now_utc();
    let signature = payload.razorpay_signature.trim();
    if !state.razorpay().verify_payment_signature(order_id, gateway_payment_id, signature) {
        repositories::payments::mark_failed(
            &mut *tx,
            &payment.id,
            Some(gateway_payment_id),
            "Signature verification failed",
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update payment"))?;
        tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit payment"))?;

        metrics::counter!(PAYMENTS_FAILED).increment(1);
        tracing::warn!(payment_id = %payment.id, user_id = %user.id, "Payment signature mismatch");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                status: "failed",
                message: "Payment verification failed",
                payment_id: None,
            }),
        ));
    }

    let completed = enrollment::complete_payment(
        &mut tx,
        &payment,
        &user,
        gateway_payment_id,
        Some(signature),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete payment"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit payment"))?;

    tracing::info!(
        payment_id = %completed.payment.id,
        user_id = %user.id,
        receipt = %completed.receipt.receipt_number,
        "Payment verified"
    );
    enrollment::send_confirmation(&state, &user, &completed);

    Ok((
        StatusCode::OK,
        Json(VerifyPaymentResponse {
            status: "success",
            message: "Payment verified successfully",
            payment_id: Some(completed.payment.id),
        }),
    ))
}

pub(in crate::api::payments) async fn validate_coupon(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let coupon = helpers::usable_coupon(&state, &payload.code).await?;

    let original_price = helpers::resolve_item(
        &state,
        &user,
        payload.course_id.as_deref(),
        payload.bundle_id.as_deref(),
    )
    .await?
    .map(|item| item.price())
    .unwrap_or(Decimal::ZERO);

    let discount_amount = pricing::coupon_discount(&coupon, original_price);
    Ok(Json(ValidateCouponResponse {
        is_valid: true,
        coupon: CouponResponse::from_db(coupon),
        original_price,
        discount_amount,
        final_price: pricing::final_amount(original_price, discount_amount),
    }))
}
