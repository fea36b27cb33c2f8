//! Bank account model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Account kinds a user may open.
pub const ACCOUNT_TYPES: &[&str] = &["user", "agent", "admin"];

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BankAccount {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub account_no: String,
    pub account_type: String,
    pub initial_deposit: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBankAccount {
    pub user_id: i64,
    pub account_no: String,
    pub account_type: String,
    pub initial_deposit: f64,
}
