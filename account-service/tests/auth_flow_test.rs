mod common;

use account_service::{config::ConsumeMode, models::CodeKind, services::UserRepository};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{settle, TestApp, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_reports_database_up() {
    let app = TestApp::new();

    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["checks"]["database"], "up");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_signup_stores_derived_secret() {
    let app = TestApp::new();

    let response = app.signup("alice@example.com").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["email"], "alice@example.com");
    assert_eq!(response.body["data"]["is_active"], false);
    assert!(response.body["data"].get("password").is_none());

    let stored = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    let fields: Vec<&str> = stored.password.trim_matches('$').split('$').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], "5");
    assert!(!stored.password.contains(TEST_PASSWORD));
}

#[tokio::test]
async fn test_signup_rejects_invalid_fields() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/auth/signup",
            json!({
                "username": "alice",
                "email": "not-an-email",
                "password": "weakpassword"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = &response.body["errors"];
    assert_eq!(errors["email"], "invalid email format");
    assert!(errors["password"].is_string());
    assert!(errors["phone_no"].is_string());
    assert!(errors.get("username").is_none());
}

#[tokio::test]
async fn test_signup_rejects_malformed_json() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON data provided as input"));
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new();

    assert_eq!(app.signup("alice@example.com").await.status, StatusCode::CREATED);
    let response = app.signup("alice@example.com").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "User account already exists");
}

#[tokio::test]
async fn test_login_sets_cookie_and_returns_token() {
    let app = TestApp::new();
    app.signup("alice@example.com").await;

    let response = app.login("alice@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    let token = response.body["data"]["token"].as_str().unwrap();
    assert_eq!(response.body["data"]["token_type"], "Bearer");
    assert_eq!(response.body["data"]["expires_in"], 24 * 3600);

    let cookie = response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with(&format!("login={}", token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let app = TestApp::new();
    app.signup("alice@example.com").await;

    let wrong = app.login("alice@example.com", "Wr0ng$ecret!").await;
    let unknown = app.login("nobody@example.com", TEST_PASSWORD).await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], unknown.body["error"]);
    assert!(wrong.headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_me_accepts_bearer_and_cookie() {
    let app = TestApp::new();
    let token = app.signup_and_login("alice@example.com").await;

    let bearer = app.get_with_token("/users/me", &token).await;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(bearer.body["data"]["email"], "alice@example.com");
    assert_eq!(bearer.body["data"]["username"], "alice");

    let cookie = app
        .send(
            Request::get("/users/me")
                .header(header::COOKIE, format!("login={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(cookie.status, StatusCode::OK);
    assert_eq!(cookie.body["data"]["email"], "alice@example.com");

    let basic_and_cookie = app
        .send(
            Request::get("/users/me")
                .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
                .header(header::COOKIE, format!("login={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(basic_and_cookie.status, StatusCode::OK);
    assert_eq!(basic_and_cookie.body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_me_rejects_missing_and_forged_tokens() {
    let app = TestApp::new();

    let missing = app
        .send(Request::get("/users/me").body(Body::empty()).unwrap())
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let forged = app.get_with_token("/users/me", "not.a.token").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let token = app.signup_and_login("alice@example.com").await;
    let lowercase = app
        .send(
            Request::get("/users/me")
                .header(header::AUTHORIZATION, format!("bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(lowercase.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_email_verification_flow() {
    let app = TestApp::new();
    app.signup("alice@example.com").await;

    let otp = app
        .latest_code(CodeKind::EmailVerification, "alice@example.com")
        .unwrap();
    assert_eq!(otp.len(), 4);
    assert!(app
        .mailer
        .last_to("alice@example.com")
        .unwrap()
        .body
        .contains(&otp));

    let wrong = app
        .post_json(
            "/auth/email/verify",
            json!({ "email": "alice@example.com", "otp": "xxxx" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/auth/email/verify",
            json!({ "email": "alice@example.com", "otp": otp }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["is_active"], true);

    settle().await;

    let replay = app
        .post_json(
            "/auth/email/verify",
            json!({ "email": "alice@example.com", "otp": otp }),
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["error"], "Invalid or expired code");
}

#[tokio::test]
async fn test_verification_request_does_not_reveal_accounts() {
    let app = TestApp::new();
    app.signup("alice@example.com").await;

    let known = app
        .post_json(
            "/auth/email/verify/request",
            json!({ "email": "alice@example.com" }),
        )
        .await;
    let unknown = app
        .post_json(
            "/auth/email/verify/request",
            json!({ "email": "nobody@example.com" }),
        )
        .await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);
    assert_eq!(
        app.store
            .codes_for(CodeKind::EmailVerification, "alice@example.com")
            .len(),
        2
    );
    assert!(app.mailer.last_to("nobody@example.com").is_none());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::with_mode(ConsumeMode::Atomic);
    app.signup("alice@example.com").await;

    let response = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "alice@example.com" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let token = app
        .latest_code(CodeKind::PasswordReset, "alice@example.com")
        .unwrap();
    assert_eq!(token.len(), 6);

    let wrong = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "email": "alice@example.com", "token": "000000x", "new_password": "N3w$ecret!!" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Invalid or expired code");

    let weak = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "email": "alice@example.com", "token": token, "new_password": "short" }),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert!(weak.body["errors"]["new_password"].is_string());

    let confirmed = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "email": "alice@example.com", "token": token, "new_password": "N3w$ecret!!" }),
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert!(app
        .latest_code(CodeKind::PasswordReset, "alice@example.com")
        .is_none());

    assert_eq!(
        app.login("alice@example.com", TEST_PASSWORD).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("alice@example.com", "N3w$ecret!!").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.headers["x-request-id"], "req-42");
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["cache-control"], "no-store");
}
