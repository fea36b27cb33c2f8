mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{json_request, TestApp};
use serde_json::json;

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = TestApp::new();
    let token = app.signup_and_login("alice@example.com").await;

    let created = app
        .send(json_request(
            Method::POST,
            "/accounts",
            json!({ "account_type": "user", "initial_deposit": 500.0 }),
            Some(&token),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let account_no = created.body["data"]["account_no"].as_str().unwrap().to_string();
    assert_eq!(account_no.len(), 64);
    assert!(created.body["data"].get("user_id").is_none());

    let listed = app.get_with_token("/accounts", &token).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let fetched = app
        .get_with_token(&format!("/accounts/{}", account_no), &token)
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["account_type"], "user");
    assert_eq!(fetched.body["data"]["initial_deposit"], 500.0);

    let closed = app
        .send(delete(&format!("/accounts/{}", account_no), &token))
        .await;
    assert_eq!(closed.status, StatusCode::OK);

    let gone = app
        .get_with_token(&format!("/accounts/{}", account_no), &token)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert!(app
        .get_with_token("/accounts", &token)
        .await
        .body["data"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_second_active_account_conflicts() {
    let app = TestApp::new();
    let token = app.signup_and_login("alice@example.com").await;
    let body = json!({ "account_type": "agent", "initial_deposit": 100 });

    let first = app
        .send(json_request(Method::POST, "/accounts", body.clone(), Some(&token)))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .send(json_request(Method::POST, "/accounts", body, Some(&token)))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_accounts_are_private_to_owner() {
    let app = TestApp::new();
    let alice = app.signup_and_login("alice@example.com").await;
    let bob = app.signup_and_login("bob@example.com").await;

    let created = app
        .send(json_request(
            Method::POST,
            "/accounts",
            json!({ "account_type": "user", "initial_deposit": 150 }),
            Some(&alice),
        ))
        .await;
    let account_no = created.body["data"]["account_no"].as_str().unwrap().to_string();

    let peek = app
        .get_with_token(&format!("/accounts/{}", account_no), &bob)
        .await;
    assert_eq!(peek.status, StatusCode::NOT_FOUND);

    let close = app
        .send(delete(&format!("/accounts/{}", account_no), &bob))
        .await;
    assert_eq!(close.status, StatusCode::NOT_FOUND);

    let still_there = app
        .get_with_token(&format!("/accounts/{}", account_no), &alice)
        .await;
    assert_eq!(still_there.status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_account_validates_input() {
    let app = TestApp::new();
    let token = app.signup_and_login("alice@example.com").await;

    let response = app
        .send(json_request(
            Method::POST,
            "/accounts",
            json!({ "account_type": "root", "initial_deposit": 10 }),
            Some(&token),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["account_type"]
        .as_str()
        .unwrap()
        .starts_with("Invalid account type"));
    assert_eq!(
        response.body["errors"]["initial_deposit"],
        "initial_deposit must be at least 100"
    );
}

#[tokio::test]
async fn test_accounts_require_session() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            Method::POST,
            "/accounts",
            json!({ "account_type": "user", "initial_deposit": 500 }),
            None,
        ))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
