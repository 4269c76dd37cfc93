use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Coupon, Payment, PaymentReceipt, Subscription};
use crate::db::types::{PaymentMethod, PaymentStatus, SubscriptionType};
use crate::schemas::datetime::deserialize_datetime;

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePaymentRequest {
    #[serde(default)]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) bundle_id: Option<String>,
    #[serde(default)]
    pub(crate) coupon_code: Option<String>,
    #[serde(default = "default_payment_method")]
    pub(crate) payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePaymentResponse {
    pub(crate) payment_db_id: String,
    pub(crate) razorpay_order_id: String,
    pub(crate) amount: Decimal,
    pub(crate) original_amount: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) currency: &'static str,
    pub(crate) key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) bundle_title: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "razorpay_order_id is required"))]
    pub(crate) razorpay_order_id: String,
    #[validate(length(min = 1, message = "razorpay_payment_id is required"))]
    pub(crate) razorpay_payment_id: String,
    #[validate(length(min = 1, message = "razorpay_signature is required"))]
    pub(crate) razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyPaymentResponse {
    pub(crate) status: &'static str,
    pub(crate) message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) payment_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ValidateCouponRequest {
    #[validate(length(min = 1, message = "code is required"))]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) bundle_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateCouponResponse {
    pub(crate) is_valid: bool,
    pub(crate) coupon: CouponResponse,
    pub(crate) original_price: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) final_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CouponCreate {
    #[validate(length(min = 1, max = 50, message = "code must be 1-50 characters"))]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub(crate) discount_amount: Option<Decimal>,
    #[serde(default = "default_max_uses")]
    #[validate(range(min = 1, message = "max_uses must be positive"))]
    pub(crate) max_uses: i32,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) valid_from: PrimitiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) valid_to: PrimitiveDateTime,
    #[serde(default = "default_true")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CouponResponse {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) description: String,
    pub(crate) discount_percentage: Option<Decimal>,
    pub(crate) discount_amount: Option<Decimal>,
    pub(crate) max_uses: i32,
    pub(crate) used_count: i32,
    pub(crate) valid_from: String,
    pub(crate) valid_to: String,
    pub(crate) is_active: bool,
}

impl CouponResponse {
    pub(crate) fn from_db(coupon: Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code,
            description: coupon.description,
            discount_percentage: coupon.discount_percentage,
            discount_amount: coupon.discount_amount,
            max_uses: coupon.max_uses,
            used_count: coupon.used_count,
            valid_from: format_primitive(coupon.valid_from),
            valid_to: format_primitive(coupon.valid_to),
            is_active: coupon.is_active,
        }
    }
}

/// Gateway signature is never echoed back.
#[derive(Debug, Serialize)]
pub(crate) struct PaymentResponse {
    pub(crate) id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) bundle_id: Option<String>,
    pub(crate) amount: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) final_amount: Decimal,
    pub(crate) coupon_id: Option<String>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) gateway_order_id: Option<String>,
    pub(crate) gateway_payment_id: Option<String>,
    pub(crate) status: PaymentStatus,
    pub(crate) failure_reason: Option<String>,
    pub(crate) enrollment_completed: bool,
    pub(crate) enrollment_date: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl PaymentResponse {
    pub(crate) fn from_db(payment: Payment) -> Self {
        Self {
            id: payment.id,
            course_id: payment.course_id,
            bundle_id: payment.bundle_id,
            amount: payment.amount,
            discount_amount: payment.discount_amount,
            final_amount: payment.final_amount,
            coupon_id: payment.coupon_id,
            payment_method: payment.payment_method,
            gateway_order_id: payment.gateway_order_id,
            gateway_payment_id: payment.gateway_payment_id,
            status: payment.status,
            failure_reason: payment.failure_reason,
            enrollment_completed: payment.enrollment_completed,
            enrollment_date: payment.enrollment_date.map(format_primitive),
            created_at: format_primitive(payment.created_at),
            updated_at: format_primitive(payment.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReceiptResponse {
    pub(crate) id: String,
    pub(crate) payment_id: String,
    pub(crate) receipt_number: String,
    pub(crate) billing_name: String,
    pub(crate) billing_email: String,
    pub(crate) amount: Decimal,
    pub(crate) issued_at: String,
}

impl ReceiptResponse {
    pub(crate) fn from_db(receipt: PaymentReceipt) -> Self {
        Self {
            id: receipt.id,
            payment_id: receipt.payment_id,
            receipt_number: receipt.receipt_number,
            billing_name: receipt.billing_name,
            billing_email: receipt.billing_email,
            amount: receipt.amount,
            issued_at: format_primitive(receipt.issued_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubscriptionResponse {
    pub(crate) id: String,
    pub(crate) subscription_type: SubscriptionType,
    pub(crate) price: Decimal,
    pub(crate) starts_at: String,
    pub(crate) ends_at: String,
    pub(crate) is_active: bool,
    pub(crate) payment_id: Option<String>,
}

impl SubscriptionResponse {
    pub(crate) fn from_db(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            subscription_type: subscription.subscription_type,
            price: subscription.price,
            starts_at: format_primitive(subscription.starts_at),
            ends_at: format_primitive(subscription.ends_at),
            is_active: subscription.is_active,
            payment_id: subscription.payment_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DateRange {
    pub(crate) start: String,
    pub(crate) end: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyticsResponse {
    pub(crate) total_revenue: Decimal,
    pub(crate) total_transactions: i64,
    pub(crate) successful_transactions: i64,
    pub(crate) failed_transactions: i64,
    pub(crate) average_transaction_value: Decimal,
    pub(crate) payment_methods: BTreeMap<String, i64>,
    pub(crate) date_range: DateRange,
}

/// Razorpay webhook envelope. Only the fields the handler reads are modelled.
#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEvent {
    pub(crate) event: String,
    #[serde(default)]
    pub(crate) payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebhookPayload {
    #[serde(default)]
    pub(crate) payment: Option<WebhookPaymentWrapper>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookPaymentWrapper {
    pub(crate) entity: WebhookPaymentEntity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookPaymentEntity {
    pub(crate) id: String,
    pub(crate) order_id: String,
    #[serde(default)]
    pub(crate) error_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebhookAck {
    pub(crate) status: &'static str,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Razorpay
}

fn default_max_uses() -> i32 {
    1
}

fn default_true() -> bool {
    true
}
