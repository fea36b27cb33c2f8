//! Shared harness for account-service integration tests.
//!
//! Builds the real router on top of `InMemoryStore` and `RecordingMailer`
//! and drives it in-process with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use account_service::{
    build_router,
    config::{
        AccountConfig, CodeConfig, ConsumeMode, DatabaseConfig, Environment, SecurityConfig,
        ServerKey, SessionConfig, SmtpConfig,
    },
    models::CodeKind,
    services::{InMemoryStore, RecordingMailer},
    AppState,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET_KEY: &str = "integration-test-secret-key";
pub const TEST_PASSWORD: &str = "Sup3r$ecret!";

pub fn test_config(consume_mode: ConsumeMode) -> AccountConfig {
    AccountConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "account-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        security: SecurityConfig {
            server_key: ServerKey::new(TEST_SECRET_KEY),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        session: SessionConfig {
            issuer: "tap_gopay".to_string(),
            ttl_hours: 24,
            cookie_name: "login".to_string(),
        },
        codes: CodeConfig {
            ttl_minutes: 60,
            otp_length: 4,
            reset_token_length: 6,
            consume_mode,
            reap_interval_seconds: 900,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            from: "no-reply@tapgopay.local".to_string(),
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mode(ConsumeMode::Detached)
    }

    pub fn with_mode(consume_mode: ConsumeMode) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(test_config(consume_mode), store.clone(), mailer.clone());

        Self {
            router: build_router(state.clone()),
            state,
            store,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(Method::POST, uri, body, None)).await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn signup(&self, email: &str) -> TestResponse {
        self.post_json(
            "/auth/signup",
            json!({
                "username": "alice",
                "email": email,
                "password": TEST_PASSWORD,
                "phone_no": "0712345678"
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/auth/login", json!({ "email": email, "password": password }))
            .await
    }

    /// Registers `email` and returns a session token for it.
    pub async fn signup_and_login(&self, email: &str) -> String {
        assert_eq!(self.signup(email).await.status, StatusCode::CREATED);
        let response = self.login(email, TEST_PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["data"]["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }

    /// Most recent stored code of `kind` for `email`.
    pub fn latest_code(&self, kind: CodeKind, email: &str) -> Option<String> {
        self.store.codes_for(kind, email).pop().map(|c| c.code)
    }
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

