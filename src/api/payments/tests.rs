use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::{compact_date, primitive_now_utc};
use crate::db::models::{Coupon, Payment};
use crate::db::types::{NotificationType, PaymentMethod, PaymentStatus};
use crate::repositories;
use crate::services::razorpay::sign_hex;
use crate::test_support;

async fn insert_coupon(
    ctx: &test_support::TestContext,
    code: &str,
    percentage: Option<Decimal>,
    amount: Option<Decimal>,
    max_uses: i32,
) -> Coupon {
    let now = primitive_now_utc();
    repositories::payments::create_coupon(
        ctx.db(),
        repositories::payments::CreateCoupon {
            id: &Uuid::new_v4().to_string(),
            code,
            description: "",
            discount_percentage: percentage,
            discount_amount: amount,
            max_uses,
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(30),
            is_active: true,
            now,
        },
    )
    .await
    .expect("insert coupon")
}

async fn insert_pending_payment(
    ctx: &test_support::TestContext,
    user_id: &str,
    course_id: Option<&str>,
    bundle_id: Option<&str>,
    amount: Decimal,
    order_id: &str,
) -> Payment {
    let id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();
    repositories::payments::create(
        ctx.db(),
        repositories::payments::CreatePayment {
            id: &id,
            user_id,
            course_id,
            bundle_id,
            amount,
            discount_amount: Decimal::ZERO,
            final_amount: amount,
            coupon_id: None,
            payment_method: PaymentMethod::Razorpay,
            now,
        },
    )
    .await
    .expect("insert payment");
    repositories::payments::set_gateway_order(ctx.db(), &id, order_id, now)
        .await
        .expect("set order")
}

fn webhook_request(body: &serde_json::Value, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/payments/webhook/razorpay")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Razorpay-Signature", signature);
    }
    builder.body(Body::from(serde_json::to_vec(body).expect("body"))).expect("request")
}

#[tokio::test]
async fn create_payment_applies_coupon_and_uses_local_order() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(1000, 0)).await;
    insert_coupon(&ctx, "SAVE10", Some(Decimal::TEN), None, 1).await;
    let token = ctx.token(&student);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/create-payment",
            Some(&token),
            Some(json!({"course_id": course.id, "coupon_code": "save10"})),
        ))
        .await
        .expect("create payment");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(test_support::decimal_field(&body["amount"]), 900.0);
    assert_eq!(test_support::decimal_field(&body["discount_amount"]), 100.0);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["course_title"], "Rust Basics");
    assert!(body.get("bundle_title").is_none());
    assert!(body["razorpay_order_id"].as_str().expect("order").starts_with("order_local_"));

    let coupon = repositories::payments::find_coupon_by_code(ctx.db(), "SAVE10")
        .await
        .expect("coupon")
        .expect("coupon row");
    assert_eq!(coupon.used_count, 1);

    let payment_id = body["payment_db_id"].as_str().expect("id").to_string();
    let stored = repositories::payments::find_by_id(ctx.db(), &payment_id)
        .await
        .expect("payment")
        .expect("payment row");
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert_eq!(stored.coupon_id.as_deref(), Some(coupon.id.as_str()));

    for (payload, message) in [
        (json!({"course_id": course.id, "coupon_code": "SAVE10"}), "Coupon is expired or invalid"),
        (json!({"course_id": course.id, "coupon_code": "NOPE"}), "Invalid coupon code"),
        (json!({"payment_method": "razorpay"}), "Either course_id or bundle_id is required"),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/payments/create-payment",
                Some(&token),
                Some(payload),
            ))
            .await
            .expect("rejected payment");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test_support::read_json(response).await;
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn validate_coupon_caps_fixed_discount_at_price() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(150, 0)).await;
    insert_coupon(&ctx, "FLAT200", None, Some(Decimal::new(200, 0)), 5).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/validate-coupon",
            Some(&ctx.token(&student)),
            Some(json!({"code": "FLAT200", "course_id": course.id})),
        ))
        .await
        .expect("validate coupon");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["coupon"]["code"], "FLAT200");
    assert_eq!(test_support::decimal_field(&body["original_price"]), 150.0);
    assert_eq!(test_support::decimal_field(&body["discount_amount"]), 150.0);
    assert_eq!(test_support::decimal_field(&body["final_price"]), 0.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/validate-coupon",
            Some(&ctx.token(&student)),
            Some(json!({"code": "FLAT200", "course_id": "missing"})),
        ))
        .await
        .expect("missing course");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signature_mismatch_marks_payment_failed() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(499, 0)).await;
    let payment =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_1")
            .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/verify-payment",
            Some(&ctx.token(&student)),
            Some(json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "deadbeef",
            })),
        ))
        .await
        .expect("verify");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "Payment verification failed");

    let stored = repositories::payments::find_by_id(ctx.db(), &payment.id)
        .await
        .expect("payment")
        .expect("payment row");
    assert_eq!(stored.status, PaymentStatus::Failed);
    assert_eq!(stored.failure_reason.as_deref(), Some("Signature verification failed"));
    assert!(!repositories::enrollments::is_active(ctx.db(), &student.id, &course.id)
        .await
        .expect("enrollment"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/verify-payment",
            Some(&ctx.token(&student)),
            Some(json!({
                "razorpay_order_id": "order_unknown",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "deadbeef",
            })),
        ))
        .await
        .expect("verify unknown");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Payment not found");
}

#[tokio::test]
async fn verified_payment_enrolls_and_issues_receipt() {
    let ctx = test_support::setup_test_context_with_webhook_secret().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let other = test_support::insert_user(ctx.db(), "o@example.com", "other", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(499, 0)).await;
    let payment =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_ok")
            .await;
    let signature = sign_hex(test_support::TEST_RAZORPAY_SECRET, b"order_ok|pay_OK123");
    let token = ctx.token(&student);

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/payments/verify-payment",
                Some(&token),
                Some(json!({
                    "razorpay_order_id": "order_ok",
                    "razorpay_payment_id": "pay_OK123",
                    "razorpay_signature": signature,
                })),
            ))
            .await
            .expect("verify");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Payment verified successfully");
        assert_eq!(body["payment_id"], payment.id);
    }

    assert!(repositories::enrollments::is_active(ctx.db(), &student.id, &course.id)
        .await
        .expect("enrollment"));
    let course_row = repositories::courses::find_by_id(ctx.db(), &course.id)
        .await
        .expect("course")
        .expect("course row");
    assert_eq!(course_row.enrollment_count, 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/payments/{}/receipt", payment.id),
            Some(&token),
            None,
        ))
        .await
        .expect("receipt");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(
        body["receipt_number"],
        format!("RCP-pay_OK123-{}", compact_date(primitive_now_utc().date()))
    );
    assert_eq!(body["billing_email"], "s@example.com");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/payments/history", Some(&token), None))
        .await
        .expect("history");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["status"], "completed");
    assert!(body[0].get("gateway_signature").is_none());

    let notifications = repositories::notifications::list(ctx.db(), Some(&student.id), 0, 10)
        .await
        .expect("notifications");
    assert!(notifications
        .iter()
        .any(|notification| notification.notification_type == NotificationType::Payment));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/payments/{}", payment.id),
            Some(&ctx.token(&other)),
            None,
        ))
        .await
        .expect("foreign payment");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refunded_payment_is_not_reported_as_verified() {
    let ctx = test_support::setup_test_context_with_webhook_secret().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(499, 0)).await;
    let payment =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_rf")
            .await;
    sqlx::query("UPDATE payments SET status = 'refunded' WHERE id = $1")
        .bind(&payment.id)
        .execute(ctx.db())
        .await
        .expect("refund payment");
    let signature = sign_hex(test_support::TEST_RAZORPAY_SECRET, b"order_rf|pay_RF1");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/verify-payment",
            Some(&ctx.token(&student)),
            Some(json!({
                "razorpay_order_id": "order_rf",
                "razorpay_payment_id": "pay_RF1",
                "razorpay_signature": signature,
            })),
        ))
        .await
        .expect("verify");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "refunded");
    assert_eq!(body["message"], "Payment has been refunded");
    assert_eq!(body["payment_id"], payment.id);

    let stored = repositories::payments::find_by_id(ctx.db(), &payment.id)
        .await
        .expect("payment")
        .expect("payment row");
    assert_eq!(stored.status, PaymentStatus::Refunded);
    assert!(!repositories::enrollments::is_active(ctx.db(), &student.id, &course.id)
        .await
        .expect("enrollment"));
}

#[tokio::test]
async fn receipt_is_missing_for_pending_payments() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(499, 0)).await;
    let payment =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_p")
            .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/payments/{}/receipt", payment.id),
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("receipt");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/payments/subscription",
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("subscription");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "No active subscription");
}

#[tokio::test]
async fn webhook_capture_enrolls_every_bundle_course() {
    let ctx = test_support::setup_test_context_with_webhook_secret().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let first =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(100, 0)).await;
    let second =
        test_support::insert_published_course(ctx.db(), "Async Rust", Decimal::new(200, 0)).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/bundles",
            Some(&ctx.token(&student)),
            Some(json!({"name": "Rust Track", "courses": [first.id, second.id]})),
        ))
        .await
        .expect("bundle");
    assert_eq!(response.status(), StatusCode::CREATED);
    let bundle = test_support::read_json(response).await;
    let bundle_id = bundle["id"].as_str().expect("bundle id").to_string();

    let payment = insert_pending_payment(
        &ctx,
        &student.id,
        None,
        Some(&bundle_id),
        Decimal::new(285, 0),
        "order_bundle",
    )
    .await;

    let event = json!({
        "event": "payment.captured",
        "payload": {"payment": {"entity": {"id": "pay_BUNDLE", "order_id": "order_bundle"}}}
    });

    let response = ctx
        .app
        .clone()
        .oneshot(webhook_request(&event, Some("00")))
        .await
        .expect("bad signature");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let signature = sign_hex(
        test_support::TEST_WEBHOOK_SECRET,
        &serde_json::to_vec(&event).expect("event bytes"),
    );
    let response = ctx
        .app
        .clone()
        .oneshot(webhook_request(&event, Some(&signature)))
        .await
        .expect("captured");
    assert_eq!(response.status(), StatusCode::OK);

    let stored = repositories::payments::find_by_id(ctx.db(), &payment.id)
        .await
        .expect("payment")
        .expect("payment row");
    assert_eq!(stored.status, PaymentStatus::Completed);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("pay_BUNDLE"));
    for course in [&first, &second] {
        assert!(repositories::enrollments::is_active(ctx.db(), &student.id, &course.id)
            .await
            .expect("enrollment"));
    }
}

#[tokio::test]
async fn webhook_failure_and_unknown_events() {
    let ctx = test_support::setup_test_context_with_webhook_secret().await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(499, 0)).await;
    let payment =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_f")
            .await;

    for event in [
        json!({
            "event": "payment.failed",
            "payload": {"payment": {"entity": {
                "id": "pay_F", "order_id": "order_f", "error_description": "Card declined"
            }}}
        }),
        json!({"event": "refund.processed", "payload": {}}),
    ] {
        let signature = sign_hex(
            test_support::TEST_WEBHOOK_SECRET,
            &serde_json::to_vec(&event).expect("event bytes"),
        );
        let response = ctx
            .app
            .clone()
            .oneshot(webhook_request(&event, Some(&signature)))
            .await
            .expect("webhook");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    let stored = repositories::payments::find_by_id(ctx.db(), &payment.id)
        .await
        .expect("payment")
        .expect("payment row");
    assert_eq!(stored.status, PaymentStatus::Failed);
    assert_eq!(stored.failure_reason.as_deref(), Some("Card declined"));
}

#[tokio::test]
async fn admin_coupons_and_analytics() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course =
        test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::new(400, 0)).await;
    let now = primitive_now_utc();
    let coupon = json!({
        "code": "launch25",
        "discount_percentage": "25",
        "max_uses": 10,
        "valid_from": crate::core::time::format_primitive(now - Duration::days(1)),
        "valid_to": crate::core::time::format_primitive(now + Duration::days(7)),
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/coupons",
            Some(&ctx.token(&student)),
            Some(coupon.clone()),
        ))
        .await
        .expect("student coupon");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/coupons",
            Some(&ctx.token(&admin)),
            Some(coupon.clone()),
        ))
        .await
        .expect("coupon");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["code"], "LAUNCH25");
    assert_eq!(body["used_count"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/payments/coupons",
            Some(&ctx.token(&admin)),
            Some(coupon),
        ))
        .await
        .expect("duplicate coupon");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let completed =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_a")
            .await;
    repositories::payments::mark_completed(ctx.db(), &completed.id, "pay_A", None, now)
        .await
        .expect("complete");
    let failed =
        insert_pending_payment(&ctx, &student.id, Some(&course.id), None, course.price, "order_b")
            .await;
    repositories::payments::mark_failed(ctx.db(), &failed.id, None, "declined", now)
        .await
        .expect("fail");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/payments/analytics",
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("analytics");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(test_support::decimal_field(&body["total_revenue"]), 400.0);
    assert_eq!(body["total_transactions"], 2);
    assert_eq!(body["successful_transactions"], 1);
    assert_eq!(body["failed_transactions"], 1);
    assert_eq!(test_support::decimal_field(&body["average_transaction_value"]), 400.0);
    assert_eq!(body["payment_methods"]["razorpay"], 2);
    assert!(body["date_range"]["start"].is_string());
}
