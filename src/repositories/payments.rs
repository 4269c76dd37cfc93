use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{Coupon, Payment, PaymentReceipt, Subscription};
use crate::db::types::{PaymentMethod, PaymentStatus};

const COUPON_COLUMNS: &str = "\
    id, code, description, discount_percentage, discount_amount, max_uses, used_count, \
    valid_from, valid_to, is_active, created_at, updated_at";
const COLUMNS: &str = "\
    id, user_id, course_id, bundle_id, amount, discount_amount, final_amount, coupon_id, \
    payment_method, gateway_order_id, gateway_payment_id, gateway_signature, status, \
    failure_reason, enrollment_completed, enrollment_date, created_at, updated_at";
const RECEIPT_COLUMNS: &str =
    "id, payment_id, receipt_number, billing_name, billing_email, amount, issued_at";
const SUBSCRIPTION_COLUMNS: &str = "\
    id, user_id, subscription_type, price, starts_at, ends_at, is_active, payment_id, \
    created_at, updated_at";

pub(crate) async fn find_coupon_by_code(
    executor: impl sqlx::PgExecutor<'_>,
    code: &str,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons WHERE upper(code) = upper($1)"
    ))
    .bind(code.trim())
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateCoupon<'a> {
    pub(crate) id: &'a str,
    pub(crate) code: &'a str,
    pub(crate) description: &'a str,
    pub(crate) discount_percentage: Option<Decimal>,
    pub(crate) discount_amount: Option<Decimal>,
    pub(crate) max_uses: i32,
    pub(crate) valid_from: PrimitiveDateTime,
    pub(crate) valid_to: PrimitiveDateTime,
    pub(crate) is_active: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_coupon(
    pool: &PgPool,
    params: CreateCoupon<'_>,
) -> Result<Coupon, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!(
        "INSERT INTO coupons (
            id, code, description, discount_percentage, discount_amount, max_uses, used_count,
            valid_from, valid_to, is_active, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,0,$7,$8,$9,$10,$10)
         RETURNING {COUPON_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.code)
    .bind(params.description)
    .bind(params.discount_percentage)
    .bind(params.discount_amount)
    .bind(params.max_uses)
    .bind(params.valid_from)
    .bind(params.valid_to)
    .bind(params.is_active)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Consumes one use of the coupon. Returns `false` when the coupon was
/// exhausted or deactivated in the meantime.
pub(crate) async fn redeem_coupon(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE coupons SET used_count = used_count + 1, updated_at = $2
         WHERE id = $1 AND is_active = TRUE AND used_count < max_uses
           AND valid_from <= $2 AND valid_to >= $2",
    )
    .bind(id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) struct CreatePayment<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) bundle_id: Option<&'a str>,
    pub(crate) amount: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) final_amount: Decimal,
    pub(crate) coupon_id: Option<&'a str>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreatePayment<'_>,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (
            id, user_id, course_id, bundle_id, amount, discount_amount, final_amount, coupon_id,
            payment_method, status, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,'pending',$10,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.bundle_id)
    .bind(params.amount)
    .bind(params.discount_amount)
    .bind(params.final_amount)
    .bind(params.coupon_id)
    .bind(params.payment_method)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_gateway_order(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    order_id: &str,
    now: PrimitiveDateTime,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET gateway_order_id = $1, updated_at = $2 WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(order_id)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!("SELECT {COLUMNS} FROM payments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Payment for a gateway order, row-locked for the state transition.
pub(crate) async fn lock_by_order(
    executor: impl sqlx::PgExecutor<'_>,
    order_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments WHERE gateway_order_id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn mark_completed(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    gateway_payment_id: &str,
    gateway_signature: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET
            status = 'completed',
            gateway_payment_id = $1,
            gateway_signature = COALESCE($2, gateway_signature),
            failure_reason = NULL,
            enrollment_completed = TRUE,
            enrollment_date = $3,
            updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(gateway_payment_id)
    .bind(gateway_signature)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn mark_failed(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    gateway_payment_id: Option<&str>,
    reason: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payments SET
            status = 'failed',
            gateway_payment_id = COALESCE($1, gateway_payment_id),
            failure_reason = $2,
            updated_at = $3
         WHERE id = $4",
    )
    .bind(gateway_payment_id)
    .bind(reason)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct CreateReceipt<'a> {
    pub(crate) id: &'a str,
    pub(crate) payment_id: &'a str,
    pub(crate) receipt_number: &'a str,
    pub(crate) billing_name: &'a str,
    pub(crate) billing_email: &'a str,
    pub(crate) amount: Decimal,
    pub(crate) now: PrimitiveDateTime,
}

/// Issues the receipt once; a repeated completion returns the existing row.
pub(crate) async fn issue_receipt(
    conn: &mut sqlx::PgConnection,
    params: CreateReceipt<'_>,
) -> Result<PaymentReceipt, sqlx::Error> {
    sqlx::query(
        "INSERT INTO payment_receipts (
            id, payment_id, receipt_number, billing_name, billing_email, amount, issued_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         ON CONFLICT (payment_id) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.payment_id)
    .bind(params.receipt_number)
    .bind(params.billing_name)
    .bind(params.billing_email)
    .bind(params.amount)
    .bind(params.now)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, PaymentReceipt>(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM payment_receipts WHERE payment_id = $1"
    ))
    .bind(params.payment_id)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn find_receipt(
    pool: &PgPool,
    payment_id: &str,
) -> Result<Option<PaymentReceipt>, sqlx::Error> {
    sqlx::query_as::<_, PaymentReceipt>(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM payment_receipts WHERE payment_id = $1"
    ))
    .bind(payment_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn active_subscription(
    pool: &PgPool,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
         WHERE user_id = $1 AND is_active = TRUE AND starts_at <= $2 AND ends_at > $2
         ORDER BY ends_at DESC
         LIMIT 1"
    ))
    .bind(user_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct AnalyticsTotals {
    pub(crate) total_transactions: i64,
    pub(crate) successful_transactions: i64,
    pub(crate) failed_transactions: i64,
    pub(crate) total_revenue: Decimal,
}

pub(crate) async fn analytics_totals(
    pool: &PgPool,
    since: PrimitiveDateTime,
) -> Result<AnalyticsTotals, sqlx::Error> {
    sqlx::query_as::<_, AnalyticsTotals>(
        "SELECT COUNT(*) AS total_transactions,
                COUNT(*) FILTER (WHERE status = 'completed') AS successful_transactions,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed_transactions,
                COALESCE(SUM(final_amount) FILTER (WHERE status = 'completed'), 0) AS total_revenue
         FROM payments
         WHERE created_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await
}

pub(crate) async fn method_counts(
    pool: &PgPool,
    since: PrimitiveDateTime,
) -> Result<Vec<(PaymentMethod, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (PaymentMethod, i64)>(
        "SELECT payment_method, COUNT(*) FROM payments
         WHERE created_at >= $1
         GROUP BY payment_method
         ORDER BY payment_method",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Payments in these states are never moved again by webhook events.
pub(crate) fn is_terminal(status: PaymentStatus) -> bool {
    matches!(status, PaymentStatus::Completed | PaymentStatus::Refunded)
}
