use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::PaymentStatus;
use crate::repositories;
use crate::schemas::payment::{
    AnalyticsResponse, CouponCreate, CouponResponse, DateRange, PaymentResponse, ReceiptResponse,
    SubscriptionResponse,
};

use super::super::helpers;

const ANALYTICS_WINDOW_DAYS: i64 = 30;

pub(in crate::api::payments) async fn payment_history(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = repositories::payments::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list payments"))?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from_db).collect()))
}

pub(in crate::api::payments) async fn get_payment(
    Path(payment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = helpers::fetch_own_payment(&state, &user, &payment_id).await?;
    Ok(Json(PaymentResponse::from_db(payment)))
}

pub(in crate::api::payments) async fn payment_receipt(
    Path(payment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let payment = helpers::fetch_own_payment(&state, &user, &payment_id).await?;
    if payment.status != PaymentStatus::Completed {
        return Err(ApiError::not_found("Receipt not found"));
    }

    let receipt = repositories::payments::find_receipt(state.db(), &payment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch receipt"))?
        .ok_or_else(|| ApiError::not_found("Receipt not found"))?;
    Ok(Json(ReceiptResponse::from_db(receipt)))
}

pub(in crate::api::payments) async fn active_subscription(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription =
        repositories::payments::active_subscription(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch subscription"))?
            .ok_or_else(|| ApiError::not_found("No active subscription"))?;
    Ok(Json(SubscriptionResponse::from_db(subscription)))
}

pub(in crate::api::payments) async fn create_coupon(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CouponCreate>,
) -> Result<(StatusCode, Json<CouponResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match (payload.discount_percentage, payload.discount_amount) {
        (None, None) => {
            return Err(ApiError::bad_request(
                "Either discount_percentage or discount_amount is required",
            ))
        }
        (Some(pct), _) if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED => {
            return Err(ApiError::bad_request("discount_percentage must be between 0 and 100"))
        }
        (_, Some(amount)) if amount <= Decimal::ZERO => {
            return Err(ApiError::bad_request("discount_amount must be positive"))
        }
        _ => {}
    }
    if payload.valid_to <= payload.valid_from {
        return Err(ApiError::bad_request("valid_to must be after valid_from"));
    }

    let code = payload.code.trim().to_uppercase();
    let coupon = repositories::payments::create_coupon(
        state.db(),
        repositories::payments::CreateCoupon {
            id: &Uuid::new_v4().to_string(),
            code: &code,
            description: payload.description.trim(),
            discount_percentage: payload.discount_percentage,
            discount_amount: payload.discount_amount,
            max_uses: payload.max_uses,
            valid_from: payload.valid_from,
            valid_to: payload.valid_to,
            is_active: payload.is_active,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Coupon code already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create coupon")
        }
    })?;

    tracing::info!(coupon_id = %coupon.id, code = %coupon.code, admin_id = %admin.id, "Coupon created");
    Ok((StatusCode::CREATED, Json(CouponResponse::from_db(coupon))))
}

pub(in crate::api::payments) async fn payment_analytics(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let end = primitive_now_utc();
    let start = end - Duration::days(ANALYTICS_WINDOW_DAYS);

    let totals = repositories::payments::analytics_totals(state.db(), start)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load payment totals"))?;
    let methods = repositories::payments::method_counts(state.db(), start)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load payment methods"))?;

    let average_transaction_value = if totals.successful_transactions > 0 {
        (totals.total_revenue / Decimal::from(totals.successful_transactions)).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let payment_methods: BTreeMap<String, i64> =
        methods.into_iter().map(|(method, count)| (method.as_str().to_string(), count)).collect();

    Ok(Json(AnalyticsResponse {
        total_revenue: totals.total_revenue,
        total_transactions: totals.total_transactions,
        successful_transactions: totals.successful_transactions,
        failed_transactions: totals.failed_transactions,
        average_transaction_value,
        payment_methods,
        date_range: DateRange { start: format_primitive(start), end: format_primitive(end) },
    }))
}
