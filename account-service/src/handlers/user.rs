use axum::{response::IntoResponse, Json};

use crate::{dtos::ApiResponse, middleware::AuthUser};

/// The snapshot embedded in the caller's session token. It reflects the
/// account as it was at login.
pub async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(ApiResponse::new("Success", user))
}
