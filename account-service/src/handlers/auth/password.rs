use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::{
        auth::{EmailRequest, PasswordResetConfirmRequest},
        ApiResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Always succeeds so callers cannot probe which addresses are registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::message(
            "If the account exists, a password reset code has been sent",
        )),
    ))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .confirm_password_reset(&req.email, &req.token, &req.new_password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Password has been reset")),
    ))
}
