use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::{
        auth::{EmailRequest, RegisterRequest, VerifyEmailRequest},
        ApiResponse,
    },
    utils::ValidatedJson,
    AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Registration successful. Check your email for a verification code.",
            user,
        )),
    ))
}

/// Always succeeds so callers cannot probe which addresses are registered.
pub async fn request_email_verification(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .request_email_verification(&req.email)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::message(
            "If the account exists and is unverified, a verification code has been sent",
        )),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.verify_email(&req.email, &req.otp).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Email verified successfully", user)),
    ))
}
