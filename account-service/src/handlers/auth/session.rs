use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    config::Environment,
    dtos::{
        auth::{LoginRequest, LoginResponse},
        ApiResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password. The token is returned in the body and set
/// as an HTTP-only cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth_service.login(&req.email, &req.password).await?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.environment == Environment::Prod);

    Ok((
        StatusCode::OK,
        jar.add(cookie),
        Json(ApiResponse::new(
            "Login successful",
            LoginResponse {
                token: session.token,
                token_type: "Bearer".to_string(),
                expires_in: session.expires_in,
                user: session.user,
            },
        )),
    ))
}
