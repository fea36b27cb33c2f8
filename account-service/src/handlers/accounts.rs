use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{accounts::CreateAccountRequest, ApiResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

pub async fn create_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.account_service.open(&user, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Bank account created", account)),
    ))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let accounts = state.account_service.list(&user).await?;
    Ok(Json(ApiResponse::new("Success fetching bank accounts", accounts)))
}

pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(account_no): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.account_service.get(&user, &account_no).await?;
    Ok(Json(ApiResponse::new("Successfully fetched bank account", account)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(account_no): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.close(&user, &account_no).await?;
    Ok(Json(ApiResponse::message("Bank account deactivated")))
}
