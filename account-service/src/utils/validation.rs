use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use service_core::validation::Validate;

/// JSON body that has passed its rule table. Decoding failures and rule
/// violations are both rejected as 400s.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid JSON data provided as input: {}",
                    e.body_text()
                ))
            })?;

        let errs = value.validate();
        if !errs.is_empty() {
            tracing::debug!(errors = %errs, "Request body failed validation");
            return Err(AppError::ValidationError(errs));
        }

        Ok(ValidatedJson(value))
    }
}
