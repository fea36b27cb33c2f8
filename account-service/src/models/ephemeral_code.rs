//! Ephemeral code model - short-lived single-use numeric codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a code is for. Each kind lives in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    EmailVerification,
    PasswordReset,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::EmailVerification => "email_verification",
            CodeKind::PasswordReset => "password_reset",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            CodeKind::EmailVerification => "otps",
            CodeKind::PasswordReset => "password_reset_tokens",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EphemeralCode {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EphemeralCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Fields required to insert a code.
#[derive(Debug, Clone)]
pub struct NewEphemeralCode {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
