use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn register_login_and_profile_flow() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "Asha@Example.com",
                "username": "asha",
                "password": "learning-rust",
                "password_confirm": "learning-rust",
                "first_name": "Asha",
                "last_name": "Rao"
            })),
        ))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["user_type"], "student");
    assert_eq!(body["user"]["full_name"], "Asha Rao");
    assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "asha@example.com", "password": "learning-rust"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let token = body["token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/profile",
            Some(&token),
            None,
        ))
        .await
        .expect("profile");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["username"], "asha");
    assert_eq!(body["profile"]["city"], "");
    assert!(body["profile"].get("reset_otp").is_none());
}

#[tokio::test]
async fn register_rejects_mismatch_and_duplicates() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.db(), "taken@example.com", "taken", "password-123").await;

    let cases = [
        (json!({"email": "a@example.com", "username": "a", "password": "password-123",
                "password_confirm": "password-321"}), "Passwords don't match"),
        (json!({"email": "b@example.com", "username": "b", "password": "short",
                "password_confirm": "short"}), "Password must be at least 8 characters long"),
        (json!({"email": "TAKEN@example.com", "username": "fresh", "password": "password-123",
                "password_confirm": "password-123"}), "A user with that email already exists"),
        (json!({"email": "c@example.com", "username": "taken", "password": "password-123",
                "password_confirm": "password-123"}), "A user with that username already exists"),
    ];

    for (payload, message) in cases {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(payload),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test_support::read_json(response).await;
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.db(), "ravi@example.com", "ravi", "password-123").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ravi@example.com", "password": "nope-nope"})),
        ))
        .await
        .expect("login");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_is_rate_limited_per_email() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.db(), "meera@example.com", "meera", "password-123").await;

    let mut last_status = StatusCode::OK;
    for _ in 0..11 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "Meera@example.com", "password": "wrong-pass"})),
            ))
            .await
            .expect("login");
        last_status = response.status();
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn logout_revokes_existing_token() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_user(ctx.db(), "kiran@example.com", "kiran", "password-123")
        .await;
    let token = ctx.token(&user);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/auth/logout", Some(&token), None))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Logout successful");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/profile", Some(&token), None))
        .await
        .expect("profile");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_updates_user_and_profile_fields() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_user(ctx.db(), "dev@example.com", "dev", "password-123").await;
    test_support::insert_user(ctx.db(), "other@example.com", "other", "password-123").await;
    let token = ctx.token(&user);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/auth/profile",
            Some(&token),
            Some(json!({"bio": "Backend learner", "first_name": "Dev"})),
        ))
        .await
        .expect("update user");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["bio"], "Backend learner");
    assert_eq!(body["first_name"], "Dev");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/auth/profile",
            Some(&token),
            Some(json!({"username": "other"})),
        ))
        .await
        .expect("update user");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/auth/profile/update",
            Some(&token),
            Some(json!({
                "city": "Pune",
                "date_of_birth": "1999-04-12",
                "github_url": "https://github.com/dev"
            })),
        ))
        .await
        .expect("update profile");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["profile"]["city"], "Pune");
    assert_eq!(body["profile"]["date_of_birth"], "1999-04-12");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/auth/update-profile",
            Some(&token),
            Some(json!({"github_url": "not a url"})),
        ))
        .await
        .expect("update profile alias");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn change_password_checks_old_password_and_rotates_token() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_user(ctx.db(), "nila@example.com", "nila", "password-123")
        .await;
    let token = ctx.token(&user);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(&token),
            Some(json!({"old_password": "password-123"})),
        ))
        .await
        .expect("change password");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Both old_password and new_password are required");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(&token),
            Some(json!({"old_password": "wrong-one", "new_password": "brand-new-pass"})),
        ))
        .await
        .expect("change password");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Old password is incorrect");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(&token),
            Some(json!({"old_password": "password-123", "new_password": "brand-new-pass"})),
        ))
        .await
        .expect("change password");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "Password changed successfully");
    let fresh_token = body["token"].as_str().expect("token").to_string();

    let stale = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/profile", Some(&token), None))
        .await
        .expect("profile");
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let fresh = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/profile",
            Some(&fresh_token),
            None,
        ))
        .await
        .expect("profile");
    assert_eq!(fresh.status(), StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_otp_flow_resets_password() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_user(ctx.db(), "leela@example.com", "leela", "password-123")
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password/send-otp",
            None,
            Some(json!({"email": "unknown@example.com"})),
        ))
        .await
        .expect("send otp");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password/send-otp",
            None,
            Some(json!({"email": "leela@example.com"})),
        ))
        .await
        .expect("send otp");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["message"], "OTP sent successfully to your email");

    let profile = repositories::user_profiles::find(ctx.db(), &user.id)
        .await
        .expect("profile")
        .expect("profile exists");
    let otp = profile.reset_otp.expect("otp stored");
    assert_eq!(otp.len(), 6);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password/verify-otp",
            None,
            Some(json!({"email": "leela@example.com", "otp": "not-it"})),
        ))
        .await
        .expect("verify otp");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Invalid or expired OTP");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password/verify-otp",
            None,
            Some(json!({"email": "leela@example.com", "otp": otp})),
        ))
        .await
        .expect("verify otp");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let reset_token = body["reset_token"].as_str().expect("reset token").to_string();
    assert_eq!(reset_token.len(), 32);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({
                "email": "leela@example.com",
                "reset_token": "wrong-token",
                "new_password": "another-pass"
            })),
        ))
        .await
        .expect("reset password");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Invalid reset token");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({
                "email": "leela@example.com",
                "reset_token": reset_token,
                "new_password": "another-pass"
            })),
        ))
        .await
        .expect("reset password");
    assert_eq!(response.status(), StatusCode::OK);

    let profile = repositories::user_profiles::find(ctx.db(), &user.id)
        .await
        .expect("profile")
        .expect("profile exists");
    assert!(profile.reset_otp.is_none());
    assert!(profile.reset_token.is_none());
    assert!(profile.otp_created_at.is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "leela@example.com", "password": "another-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_user(ctx.db(), "old@example.com", "old", "password-123").await;

    let issued = primitive_now_utc() - Duration::minutes(11);
    repositories::user_profiles::get_or_create(ctx.db(), &user.id, issued)
        .await
        .expect("profile");
    repositories::user_profiles::store_otp(ctx.db(), &user.id, "123456", issued)
        .await
        .expect("store otp");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password/verify-otp",
            None,
            Some(json!({"email": "old@example.com", "otp": "123456"})),
        ))
        .await
        .expect("verify otp");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn admin_lists_and_fetches_students() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
    let student =
        test_support::insert_user(ctx.db(), "priya@example.com", "priya", "password-123").await;
    test_support::insert_user(ctx.db(), "arjun@example.com", "arjun", "password-123").await;
    let admin_token = ctx.token(&admin);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/users?search=pri",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("list users");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let users = body.as_array().expect("array");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "priya");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/auth/users/{}", student.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("get user");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["user"]["email"], "priya@example.com");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/users/missing",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("get user");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let student_token = ctx.token(&student);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/users",
            Some(&student_token),
            None,
        ))
        .await
        .expect("list users");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
