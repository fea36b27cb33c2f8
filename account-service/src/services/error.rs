use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("User already has a bank account")]
    AccountAlreadyExists,

    #[error("Bank account not found")]
    AccountNotFound,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Internal(e) => AppError::InternalError(e),
            // Unknown account and wrong password are indistinguishable to callers.
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("User account already exists"))
            }
            ServiceError::InvalidOrExpiredCode => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired code"))
            }
            ServiceError::CodeGeneration(e) => AppError::InternalError(anyhow::anyhow!(e)),
            ServiceError::Token(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::AccountAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("User already has a bank account"))
            }
            ServiceError::AccountNotFound => {
                AppError::NotFound(anyhow::anyhow!("Bank account not found"))
            }
        }
    }
}
