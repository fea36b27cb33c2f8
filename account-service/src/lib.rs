pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers_middleware, request_id_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AccountConfig;
use crate::services::{
    AccountRepository, AccountService, AuthService, CodeRepository, EphemeralCodeStore,
    HealthCheck, Mailer, SessionTokenService, UserRepository,
};
use crate::utils::CredentialHasher;

#[derive(Clone)]
pub struct AppState {
    pub config: AccountConfig,
    pub sessions: SessionTokenService,
    pub codes: EphemeralCodeStore,
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Wire every component from one store implementing all repository traits.
    pub fn new<S>(config: AccountConfig, store: Arc<S>, mailer: Arc<dyn Mailer>) -> Self
    where
        S: UserRepository + CodeRepository + AccountRepository + HealthCheck + 'static,
    {
        let key = &config.security.server_key;
        let sessions = SessionTokenService::new(key, &config.session);
        let codes = EphemeralCodeStore::new(store.clone(), &config.codes);
        let auth_service = AuthService::new(
            store.clone(),
            codes.clone(),
            CredentialHasher::new(key.clone()),
            sessions.clone(),
            mailer,
            &config.codes,
        );
        let account_service = AccountService::new(store.clone());

        Self {
            config,
            sessions,
            codes,
            auth_service,
            account_service,
            health: store,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(handlers::get_me))
        .route(
            "/accounts",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route(
            "/accounts/:account_no",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route(
            "/auth/email/verify/request",
            post(handlers::request_email_verification),
        )
        .route("/auth/email/verify", post(handlers::verify_email))
        .route(
            "/auth/password-reset/request",
            post(handlers::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::confirm_password_reset),
        )
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    // Credentials cannot be combined with a wildcard origin.
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.health.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
