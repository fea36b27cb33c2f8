//! PostgreSQL implementation of the repository traits.
//!
//! Uses runtime-checked `sqlx` queries. Code tables are selected by
//! [`CodeKind::table`], which only ever yields fixed identifiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::models::{
    BankAccount, CodeKind, EphemeralCode, NewBankAccount, NewEphemeralCode, NewUser, User,
};
use crate::services::{AccountRepository, CodeRepository, HealthCheck, UserRepository};

const USER_COLUMNS: &str = "id, username, email, password, phone_no, is_active, created_at";
const CODE_COLUMNS: &str = "id, email, code, created_at, expires_at";
const ACCOUNT_COLUMNS: &str =
    "id, user_id, account_no, account_type, initial_deposit, is_active, created_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                anyhow::anyhow!("Database health check failed: {}", e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<Option<User>, anyhow::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password, phone_no) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.phone_no)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn activate_user(&self, email: &str) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("UPDATE users SET is_active = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, email: &str, secret: &str) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE email = $2")
            .bind(secret)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CodeRepository for Database {
    async fn insert_code(
        &self,
        kind: CodeKind,
        code: NewEphemeralCode,
    ) -> Result<EphemeralCode, anyhow::Error> {
        let query = format!(
            "INSERT INTO {} (email, code, expires_at) VALUES ($1, $2, $3) RETURNING {}",
            kind.table(),
            CODE_COLUMNS
        );
        Ok(sqlx::query_as::<_, EphemeralCode>(&query)
            .bind(&code.email)
            .bind(&code.code)
            .bind(code.expires_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error> {
        let query = format!(
            "SELECT {} FROM {} \
             WHERE email = $1 AND code = $2 AND expires_at > $3 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            CODE_COLUMNS,
            kind.table()
        );
        Ok(sqlx::query_as::<_, EphemeralCode>(&query)
            .bind(email)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_code(&self, kind: CodeKind, id: i64) -> Result<(), anyhow::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
        sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn take_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error> {
        let table = kind.table();
        let query = format!(
            "DELETE FROM {table} WHERE id = ( \
                 SELECT id FROM {table} \
                 WHERE email = $1 AND code = $2 AND expires_at > $3 \
                 ORDER BY created_at DESC, id DESC LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) RETURNING {columns}",
            table = table,
            columns = CODE_COLUMNS
        );
        Ok(sqlx::query_as::<_, EphemeralCode>(&query)
            .bind(email)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn purge_expired_codes(
        &self,
        kind: CodeKind,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error> {
        let query = format!("DELETE FROM {} WHERE expires_at <= $1", kind.table());
        let result = sqlx::query(&query).bind(now).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AccountRepository for Database {
    async fn create_account(
        &self,
        account: NewBankAccount,
    ) -> Result<Option<BankAccount>, anyhow::Error> {
        let query = format!(
            "INSERT INTO accounts (user_id, account_no, account_type, initial_deposit) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) WHERE is_active DO NOTHING \
             RETURNING {}",
            ACCOUNT_COLUMNS
        );
        Ok(sqlx::query_as::<_, BankAccount>(&query)
            .bind(account.user_id)
            .bind(&account.account_no)
            .bind(&account.account_type)
            .bind(account.initial_deposit)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_accounts(&self, user_id: i64) -> Result<Vec<BankAccount>, anyhow::Error> {
        let query = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND is_active ORDER BY created_at",
            ACCOUNT_COLUMNS
        );
        Ok(sqlx::query_as::<_, BankAccount>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<Option<BankAccount>, anyhow::Error> {
        let query = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND account_no = $2 AND is_active",
            ACCOUNT_COLUMNS
        );
        Ok(sqlx::query_as::<_, BankAccount>(&query)
            .bind(user_id)
            .bind(account_no)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn deactivate_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET is_active = FALSE \
             WHERE user_id = $1 AND account_no = $2 AND is_active",
        )
        .bind(user_id)
        .bind(account_no)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
