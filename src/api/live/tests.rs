use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::LiveClass;
use crate::db::types::{LiveClassStatus, NotificationType};
use crate::repositories;
use crate::test_support;

async fn insert_class(
    ctx: &test_support::TestContext,
    course_id: &str,
    created_by: &str,
    start_offset: Duration,
    length: Duration,
) -> LiveClass {
    let start = primitive_now_utc() + start_offset;
    repositories::live_classes::create(
        ctx.db(),
        repositories::live_classes::CreateLiveClass {
            id: &Uuid::new_v4().to_string(),
            course_id,
            title: "Ownership Deep Dive",
            description: "Borrowing in practice",
            instructor: "Test admin",
            scheduled_start: start,
            scheduled_end: start + length,
            meeting_id: "ownership-deep-dive-1700000000-abcdef12",
            meeting_url: "https://meet.jit.si/ownership-deep-dive-1700000000-abcdef12",
            max_participants: 100,
            created_by,
            now: primitive_now_utc(),
        },
    )
    .await
    .expect("insert live class")
}

#[tokio::test]
async fn only_admins_create_live_classes() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;

    let start = primitive_now_utc() + Duration::hours(2);
    let body = json!({
        "course": course.id,
        "title": "Ownership: Q&A Session!",
        "scheduled_start": format_primitive(start),
        "scheduled_end": format_primitive(start + Duration::hours(1)),
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/live/live-classes/create",
            Some(&ctx.token(&student)),
            Some(body.clone()),
        ))
        .await
        .expect("student create");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = test_support::read_json(response).await;
    assert_eq!(error["error"], "Only admin users can create live classes.");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/live/live-classes/create",
            Some(&ctx.token(&admin)),
            Some(body),
        ))
        .await
        .expect("admin create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    let room = created["meeting_id"].as_str().expect("room");
    assert!(room.starts_with("ownership-q-a-session-"));
    assert!(room.len() <= 50);
    assert!(!room.contains("--"));
    assert_eq!(created["meeting_url"], format!("https://meet.jit.si/{room}"));
    assert_eq!(created["instructor"], "Test admin");
    assert_eq!(created["status"], "scheduled");
    assert_eq!(created["max_participants"], 100);
}

#[tokio::test]
async fn create_rejects_inverted_schedule_and_unknown_course() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let token = ctx.token(&admin);
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let start = primitive_now_utc() + Duration::hours(2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/live/live-classes/create",
            Some(&token),
            Some(json!({
                "course": course.id,
                "title": "Backwards",
                "scheduled_start": format_primitive(start),
                "scheduled_end": format_primitive(start - Duration::minutes(30)),
            })),
        ))
        .await
        .expect("inverted");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/live/live-classes/create",
            Some(&token),
            Some(json!({
                "course": "missing-course",
                "title": "Orphan",
                "scheduled_start": format_primitive(start),
                "scheduled_end": format_primitive(start + Duration::hours(1)),
            })),
        ))
        .await
        .expect("unknown course");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_syncs_statuses_and_scopes_to_enrollments() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let enrolled = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let other = test_support::insert_published_course(ctx.db(), "Go Basics", Decimal::ZERO).await;
    test_support::enroll(ctx.db(), &student.id, &enrolled.id).await;

    let running =
        insert_class(&ctx, &enrolled.id, &admin.id, -Duration::minutes(10), Duration::hours(1))
            .await;
    let finished =
        insert_class(&ctx, &enrolled.id, &admin.id, -Duration::hours(3), Duration::hours(1)).await;
    let upcoming =
        insert_class(&ctx, &enrolled.id, &admin.id, Duration::hours(5), Duration::hours(1)).await;
    insert_class(&ctx, &other.id, &admin.id, Duration::hours(5), Duration::hours(1)).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/live/live-classes",
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("student list");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let classes = body.as_array().expect("array");
    assert_eq!(classes.len(), 3);
    let status_of = |id: &str| {
        classes.iter().find(|class| class["id"] == id).map(|class| class["status"].clone())
    };
    assert_eq!(status_of(&running.id), Some(json!("live")));
    assert_eq!(status_of(&finished.id), Some(json!("completed")));
    assert_eq!(status_of(&upcoming.id), Some(json!("scheduled")));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/live/live-classes",
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("admin list");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(4));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/live/live-classes/upcoming",
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("upcoming");
    let body = test_support::read_json(response).await;
    let upcoming_ids: Vec<_> = body.as_array().expect("array").iter().map(|c| c["id"].clone()).collect();
    assert_eq!(upcoming_ids, vec![json!(upcoming.id)]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/live/live-classes/{}/status", running.id),
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("status live");
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "live");
    assert_eq!(body["meeting_url"], running.meeting_url);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/live/live-classes/{}/status", upcoming.id),
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("status scheduled");
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "scheduled");
    assert!(body["meeting_url"].is_null());
}

#[tokio::test]
async fn detail_requires_enrollment() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let class = insert_class(&ctx, &course.id, &admin.id, Duration::hours(1), Duration::hours(1)).await;

    for uri in [
        format!("/api/v1/live/live-classes/{}", class.id),
        format!("/api/v1/live/courses/{}/live-classes", course.id),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &uri, Some(&ctx.token(&student)), None))
            .await
            .expect("detail");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = test_support::read_json(response).await;
        assert_eq!(body["error"], "Access denied");
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/live/live-classes/missing",
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("missing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn join_and_leave_track_attendance() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let outsider = test_support::insert_user(ctx.db(), "o@example.com", "outsider", "pass-1234").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    test_support::enroll(ctx.db(), &student.id, &course.id).await;
    let class =
        insert_class(&ctx, &course.id, &admin.id, -Duration::minutes(5), Duration::hours(1)).await;
    let join_uri = format!("/api/v1/live/live-classes/{}/join", class.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, &join_uri, Some(&ctx.token(&outsider)), None))
        .await
        .expect("outsider join");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "You are not enrolled in this course");

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::POST, &join_uri, Some(&ctx.token(&student)), None))
            .await
            .expect("join");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["message"], "Successfully joined live class");
        assert_eq!(body["room_name"], class.meeting_id);
        assert_eq!(body["display_name"], "Test student");
        assert_eq!(body["domain"], "meet.jit.si");
        assert_eq!(body["is_moderator"], false);
        assert!(body["jwt"].is_null());
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/live/live-classes/{}/attendees", class.id),
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("attendees");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_attendees"], 1);
    assert_eq!(body["currently_online"], 1);
    assert_eq!(body["attendees"][0]["username"], "student");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/leave", class.id),
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("leave");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Successfully left live class");
    assert_eq!(body["duration_minutes"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/leave", class.id),
            Some(&ctx.token(&outsider)),
            None,
        ))
        .await
        .expect("outsider leave");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Attendance record not found");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/live/attendance/history",
            Some(&ctx.token(&student)),
            None,
        ))
        .await
        .expect("history");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_classes_attended"], 1);
    assert_eq!(body["total_duration_minutes"], 0);
    assert_eq!(body["attendance"][0]["class_title"], "Ownership Deep Dive");
}

#[tokio::test]
async fn completed_classes_cannot_be_joined() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let class =
        insert_class(&ctx, &course.id, &admin.id, -Duration::hours(2), Duration::hours(1)).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/join", class.id),
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "This live class is not available");
}

#[tokio::test]
async fn join_issues_a_room_token_when_configured() {
    let ctx = test_support::setup_test_context_with_jitsi().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let class =
        insert_class(&ctx, &course.id, &admin.id, -Duration::minutes(5), Duration::hours(1)).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/join", class.id),
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["is_moderator"], true);
    let jwt = body["jwt"].as_str().expect("jwt");
    assert_eq!(jwt.split('.').count(), 3);
}

#[tokio::test]
async fn admin_controls_class_lifecycle() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student = test_support::insert_user(ctx.db(), "s@example.com", "student", "pass-1234").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    test_support::enroll(ctx.db(), &student.id, &course.id).await;
    let class =
        insert_class(&ctx, &course.id, &admin.id, Duration::minutes(30), Duration::hours(1)).await;
    let admin_token = ctx.token(&admin);
    let student_token = ctx.token(&student);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/start", class.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("student start");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/start", class.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Live class started successfully");
    assert_eq!(body["status"], "live");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/join", class.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/end", class.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("end");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Live class ended successfully");
    assert_eq!(body["status"], "completed");

    let attendees = repositories::live_classes::list_attendees(ctx.db(), &class.id)
        .await
        .expect("attendees");
    assert_eq!(attendees.len(), 1);
    assert!(attendees[0].attendance.left_at.is_some());

    let stored = repositories::live_classes::find_by_id(ctx.db(), &class.id)
        .await
        .expect("find")
        .expect("class");
    assert_eq!(stored.status, LiveClassStatus::Completed);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/live/live-classes/{}/stop-delete", class.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Live class stopped and deleted successfully.");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/live/live-classes/{}/stop-delete", class.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("delete again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_updates_class_schedule() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    let class = insert_class(&ctx, &course.id, &admin.id, Duration::hours(1), Duration::hours(1)).await;
    let uri = format!("/api/v1/live/live-classes/{}", class.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &uri,
            Some(&ctx.token(&admin)),
            Some(json!({"scheduled_end": format_primitive(class.scheduled_start - Duration::minutes(1))})),
        ))
        .await
        .expect("inverted update");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &uri,
            Some(&ctx.token(&admin)),
            Some(json!({"title": "Lifetimes Deep Dive", "max_participants": 25, "status": "cancelled"})),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["title"], "Lifetimes Deep Dive");
    assert_eq!(body["max_participants"], 25);
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn recordings_and_reminders() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let first = test_support::insert_user(ctx.db(), "a@example.com", "alice", "pass-1234").await;
    let second = test_support::insert_user(ctx.db(), "b@example.com", "bob", "pass-1234").await;
    let course = test_support::insert_published_course(ctx.db(), "Rust Basics", Decimal::ZERO).await;
    test_support::enroll(ctx.db(), &first.id, &course.id).await;
    test_support::enroll(ctx.db(), &second.id, &course.id).await;
    let class = insert_class(&ctx, &course.id, &admin.id, Duration::hours(1), Duration::hours(1)).await;
    let recording_uri = format!("/api/v1/live/live-classes/{}/recording", class.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &recording_uri, Some(&ctx.token(&first)), None))
        .await
        .expect("no recording");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Recording not available for this class");

    let save_uri = format!("/api/v1/live/live-classes/{}/save-recording", class.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &save_uri,
            Some(&ctx.token(&admin)),
            Some(json!({"recording_url": "  "})),
        ))
        .await
        .expect("blank recording");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Recording URL is required");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &save_uri,
            Some(&ctx.token(&admin)),
            Some(json!({"recording_url": "https://cdn.example.com/rec.mp4"})),
        ))
        .await
        .expect("save recording");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &recording_uri, Some(&ctx.token(&first)), None))
        .await
        .expect("recording");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["recording_url"], "https://cdn.example.com/rec.mp4");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/live/live-classes/{}/send-reminder", class.id),
            Some(&ctx.token(&admin)),
            None,
        ))
        .await
        .expect("reminder");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Reminder sent to 2 students");

    let notifications = repositories::notifications::list(ctx.db(), Some(&second.id), 0, 10)
        .await
        .expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::LiveClass);
    assert_eq!(notifications[0].course_id.as_deref(), Some(course.id.as_str()));
}
