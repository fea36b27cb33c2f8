use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::{
    models::UserSnapshot,
    services::extract_subject,
    AppState,
};

/// Token from `Authorization: Bearer <token>`, falling back to the session cookie.
/// Any other `Authorization` scheme is ignored.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let mut parts = value.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some("Bearer"), Some(token), None) => Some(token.to_string()),
                _ => None,
            }
        });

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Middleware to require a valid session token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers(), &state.config.session.cookie_name).ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!(
            "Authorization required. Use 'Bearer <token>' or the session cookie"
        ))
    })?;

    let claims = state.sessions.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    let user: UserSnapshot = extract_subject(&claims).map_err(|e| {
        tracing::warn!(error = %e, subject = %claims.sub, "Session token has no usable snapshot");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// The caller's user snapshot, as embedded in their session token.
pub struct AuthUser(pub UserSnapshot);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<UserSnapshot>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "User snapshot missing from request extensions"
            ))
        })?;

        Ok(AuthUser(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("login=cookie-token"));

        assert_eq!(session_token(&headers, "login").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; login=cookie-token"));

        assert_eq!(session_token(&headers, "login").as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_other_schemes_fall_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("login=cookie-token"));

        assert_eq!(session_token(&headers, "login").as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_malformed_authorization_is_rejected() {
        for value in ["Token abc", "Bearer", "Bearer a b", "bearer abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
            assert!(session_token(&headers, "login").is_none(), "accepted {:?}", value);
        }
    }
}
