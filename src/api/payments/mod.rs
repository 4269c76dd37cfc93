mod handlers;
mod helpers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment", post(handlers::create_payment))
        .route("/verify-payment", post(handlers::verify_payment))
        .route("/validate-coupon", post(handlers::validate_coupon))
        .route("/history", get(handlers::payment_history))
        .route("/subscription", get(handlers::active_subscription))
        .route("/coupons", post(handlers::create_coupon))
        .route("/analytics", get(handlers::payment_analytics))
        .route("/webhook/razorpay", post(handlers::razorpay_webhook))
        .route("/:payment_id", get(handlers::get_payment))
        .route("/:payment_id/receipt", get(handlers::payment_receipt))
}

#[cfg(test)]
mod tests;
