//! Persistence seams. `Database` backs these with PostgreSQL and
//! `InMemoryStore` with process memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    BankAccount, CodeKind, EphemeralCode, NewBankAccount, NewEphemeralCode, NewUser, User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;

    /// Returns `None` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, anyhow::Error>;

    async fn activate_user(&self, email: &str) -> Result<bool, anyhow::Error>;

    async fn update_password(&self, email: &str, secret: &str) -> Result<bool, anyhow::Error>;
}

#[async_trait]
pub trait CodeRepository: Send + Sync {
    async fn insert_code(
        &self,
        kind: CodeKind,
        code: NewEphemeralCode,
    ) -> Result<EphemeralCode, anyhow::Error>;

    /// Most recent code for `email` equal to `code` that expires after `now`.
    async fn find_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error>;

    async fn delete_code(&self, kind: CodeKind, id: i64) -> Result<(), anyhow::Error>;

    /// Find and delete in one step; at most one caller gets the record.
    async fn take_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error>;

    async fn purge_expired_codes(
        &self,
        kind: CodeKind,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error>;
}

/// Only active accounts are visible through this trait.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts the account unless the user already holds an active one,
    /// in which case `None` is returned.
    async fn create_account(
        &self,
        account: NewBankAccount,
    ) -> Result<Option<BankAccount>, anyhow::Error>;

    async fn list_accounts(&self, user_id: i64) -> Result<Vec<BankAccount>, anyhow::Error>;

    async fn find_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<Option<BankAccount>, anyhow::Error>;

    async fn deactivate_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<bool, anyhow::Error>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}
