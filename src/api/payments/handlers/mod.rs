mod checkout;
mod records;
mod webhook;

pub(super) use checkout::{create_payment, validate_coupon, verify_payment};
pub(super) use records::{
    active_subscription, create_coupon, get_payment, payment_analytics, payment_history,
    payment_receipt,
};
pub(super) use webhook::razorpay_webhook;
