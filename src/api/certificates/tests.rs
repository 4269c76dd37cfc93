use axum::body::to_bytes;
use axum::http::{header, HeaderValue, Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use tower::ServiceExt;

use crate::db::models::{Course, User};
use crate::db::types::NotificationType;
use crate::repositories;
use crate::test_support;

const LAYOUT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><text>{{holder_name}}</text><text>{{certificate_number}}</text><image href="{{qr_code}}"/></svg>"#;

async fn create_template(ctx: &test_support::TestContext, admin: &User) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates/certificate-templates",
            Some(&ctx.token(admin)),
            Some(json!({"name": "Classic", "layout_svg": LAYOUT})),
        ))
        .await
        .expect("create template");
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Published course with one lesson the student is enrolled in.
async fn enrolled_course(ctx: &test_support::TestContext, student: &User, title: &str) -> (Course, String) {
    let course = test_support::insert_published_course(ctx.db(), title, Decimal::new(100, 0)).await;
    let section = test_support::insert_section(ctx.db(), &course.id, "Basics").await;
    let lesson = test_support::insert_lesson(ctx.db(), &section.id, "Intro", 1, false).await;
    test_support::enroll(ctx.db(), &student.id, &course.id).await;
    (course, lesson.id)
}

async fn complete_lesson(ctx: &test_support::TestContext, student: &User, lesson_id: &str) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/progress/lesson-progress/{lesson_id}"),
            Some(&ctx.token(student)),
            Some(json!({"is_completed": true})),
        ))
        .await
        .expect("complete lesson");
    assert_eq!(response.status(), StatusCode::OK);
}

fn generate_course_request(token: &str, course_id: &str) -> axum::http::Request<axum::body::Body> {
    test_support::json_request(
        Method::POST,
        &format!("/api/v1/certificates/certificates/generate/course/{course_id}"),
        Some(token),
        None,
    )
}

#[tokio::test]
async fn completed_course_issues_certificate_once() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    create_template(&ctx, &admin).await;
    let (course, lesson_id) = enrolled_course(&ctx, &student, "Rust Basics").await;
    complete_lesson(&ctx, &student, &lesson_id).await;
    let token = ctx.token(&student);

    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("generate");
    assert_eq!(response.status(), StatusCode::CREATED);
    let certificate = test_support::read_json(response).await;
    let certificate_id = certificate["id"].as_str().expect("id").to_string();
    let number = certificate["certificate_number"].as_str().expect("number");
    let year = crate::core::time::primitive_now_utc().year();
    let suffix = number.strip_prefix(&format!("CERT-{year}-")).expect("number prefix");
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(certificate["certificate_type"], "course");
    assert_eq!(certificate["course_id"], course.id.as_str());
    assert_eq!(certificate["title"], "Certificate of Completion");
    assert_eq!(certificate["has_file"], true);
    assert_eq!(
        certificate["verification_url"],
        format!("http://localhost:3000/certificates/verify/{certificate_id}")
    );
    assert!(certificate["description"]
        .as_str()
        .expect("description")
        .contains("completed the course Rust Basics"));

    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("again");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Certificate already exists");
    assert_eq!(body["certificate_id"], certificate_id.as_str());

    let notifications =
        repositories::notifications::list(ctx.db(), Some(&student.id), 0, 10).await.expect("list");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::Certificate);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/certificates/certificates",
            Some(&token),
            None,
        ))
        .await
        .expect("list certificates");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().expect("certificates").len(), 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/certificates/certificates/download/{certificate_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("download");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"certificate_{number}.svg\"").as_str()
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("svg body");
    let svg = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(svg.contains("Test student"));
    assert!(svg.contains(number));
    assert!(svg.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn generation_requires_completed_progress_and_template() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let (course, lesson_id) = enrolled_course(&ctx, &student, "Rust Basics").await;
    let token = ctx.token(&student);

    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("no progress");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Course progress not found");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/progress/course-progress/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("create progress row");
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("incomplete");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Course not completed yet");

    complete_lesson(&ctx, &student, &lesson_id).await;
    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("no template");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "No certificate template available");

    create_template(&ctx, &admin).await;
    let response =
        ctx.app.clone().oneshot(generate_course_request(&token, &course.id)).await.expect("issued");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn verification_is_public_and_logged() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    create_template(&ctx, &admin).await;
    let (course, lesson_id) = enrolled_course(&ctx, &student, "Rust Basics").await;
    complete_lesson(&ctx, &student, &lesson_id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(generate_course_request(&ctx.token(&student), &course.id))
        .await
        .expect("generate");
    let certificate = test_support::read_json(response).await;
    let certificate_id = certificate["id"].as_str().expect("id").to_string();

    let mut request = test_support::json_request(
        Method::GET,
        &format!("/api/v1/certificates/certificates/verify/{certificate_id}"),
        None,
        None,
    );
    request.headers_mut().insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
    request.headers_mut().insert(header::USER_AGENT, HeaderValue::from_static("verifier/1.0"));
    let response = ctx.app.clone().oneshot(request).await.expect("verify");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["certificate"]["id"], certificate_id.as_str());
    assert!(body.get("message").is_none());

    let (ip, agent, verified_by): (Option<String>, String, Option<String>) = sqlx::query_as(
        "SELECT ip_address, user_agent, verified_by FROM certificate_verifications
         WHERE certificate_id = $1",
    )
    .bind(&certificate_id)
    .fetch_one(ctx.db())
    .await
    .expect("verification row");
    assert_eq!(ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(agent, "verifier/1.0");
    assert_eq!(verified_by, None);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/certificates/certificates/verify/unknown",
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("verify unknown");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Certificate not found or invalid");
}

#[tokio::test]
async fn certificates_are_private_and_shareable() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let other = test_support::insert_user(ctx.db(), "o@example.com", "other", "pass-1234").await;
    create_template(&ctx, &admin).await;
    let (course, lesson_id) = enrolled_course(&ctx, &student, "Rust Basics").await;
    complete_lesson(&ctx, &student, &lesson_id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(generate_course_request(&ctx.token(&student), &course.id))
        .await
        .expect("generate");
    let certificate = test_support::read_json(response).await;
    let certificate_id = certificate["id"].as_str().expect("id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/certificates/certificates/{certificate_id}"),
            Some(&ctx.token(&other)),
            None,
        ))
        .await
        .expect("foreign certificate");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let share_uri = format!("/api/v1/certificates/certificates/share/{certificate_id}");
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &share_uri,
            Some(&ctx.token(&student)),
            Some(json!({})),
        ))
        .await
        .expect("share without email");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Email address required");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &share_uri,
            Some(&ctx.token(&student)),
            Some(json!({"email": "not-an-email"})),
        ))
        .await
        .expect("share bad email");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &share_uri,
            Some(&ctx.token(&student)),
            Some(json!({"email": "recruiter@example.com"})),
        ))
        .await
        .expect("share");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Certificate shared successfully");
}

#[tokio::test]
async fn completed_bundle_issues_bundle_certificate() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    create_template(&ctx, &admin).await;
    let (course, lesson_id) = enrolled_course(&ctx, &student, "Rust Basics").await;
    let token = ctx.token(&student);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/bundles",
            Some(&token),
            Some(json!({"name": "Rust Track", "courses": [course.id]})),
        ))
        .await
        .expect("bundle");
    assert_eq!(response.status(), StatusCode::CREATED);
    let bundle = test_support::read_json(response).await;
    let bundle_id = bundle["id"].as_str().expect("bundle id").to_string();
    let generate_uri = format!("/api/v1/certificates/certificates/generate/bundle/{bundle_id}");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, &generate_uri, Some(&token), None))
        .await
        .expect("no bundle progress");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    complete_lesson(&ctx, &student, &lesson_id).await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, &generate_uri, Some(&token), None))
        .await
        .expect("bundle certificate");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["certificate_type"], "bundle");
    assert_eq!(body["bundle_id"], bundle_id.as_str());
    assert!(body["course_id"].is_null());
}

#[tokio::test]
async fn templates_are_listed_for_users_and_created_by_admins() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates/certificate-templates",
            Some(&ctx.token(&student)),
            Some(json!({"name": "Classic", "layout_svg": LAYOUT})),
        ))
        .await
        .expect("student template");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates/certificate-templates",
            Some(&ctx.token(&admin)),
            Some(json!({"name": "Plain", "layout_svg": "<svg>{{holder_name}}</svg>"})),
        ))
        .await
        .expect("template without qr");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    create_template(&ctx, &admin).await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates/certificate-templates",
            Some(&ctx.token(&admin)),
            Some(json!({"name": "Retired", "layout_svg": LAYOUT, "is_active": false})),
        ))
        .await
        .expect("inactive template");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/certificates/certificate-templates",
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("list templates");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let templates = body.as_array().expect("templates");
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["name"], "Classic");
}
