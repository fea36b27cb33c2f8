use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    BankAccount, CodeKind, EphemeralCode, NewBankAccount, NewEphemeralCode, NewUser, User,
};
use crate::services::{AccountRepository, CodeRepository, HealthCheck, UserRepository};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    codes: HashMap<CodeKind, Vec<EphemeralCode>>,
    accounts: Vec<BankAccount>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_code_index(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Option<usize> {
        let codes = self.codes.get(&kind)?;
        codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.email == email && c.code == code && !c.is_expired_at(now))
            .max_by_key(|(_, c)| (c.created_at, c.id))
            .map(|(idx, _)| idx)
    }
}

/// Process-local store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, anyhow::Error> {
        self.tables
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory store mutex poisoned: {}", e))
    }

    /// Every stored code of `kind` for `email`, oldest first.
    pub fn codes_for(&self, kind: CodeKind, email: &str) -> Vec<EphemeralCode> {
        self.lock()
            .map(|t| {
                t.codes
                    .get(&kind)
                    .map(|codes| codes.iter().filter(|c| c.email == email).cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<Option<User>, anyhow::Error> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }

        let created = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password: user.password,
            phone_no: Some(user.phone_no),
            is_active: false,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(Some(created))
    }

    async fn activate_user(&self, email: &str) -> Result<bool, anyhow::Error> {
        let mut tables = self.lock()?;
        match tables.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.is_active = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(&self, email: &str, secret: &str) -> Result<bool, anyhow::Error> {
        let mut tables = self.lock()?;
        match tables.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.password = secret.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CodeRepository for InMemoryStore {
    async fn insert_code(
        &self,
        kind: CodeKind,
        code: NewEphemeralCode,
    ) -> Result<EphemeralCode, anyhow::Error> {
        let mut tables = self.lock()?;
        let record = EphemeralCode {
            id: tables.next_id(),
            email: code.email,
            code: code.code,
            created_at: Utc::now(),
            expires_at: code.expires_at,
        };
        tables.codes.entry(kind).or_default().push(record.clone());
        Ok(record)
    }

    async fn find_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error> {
        let tables = self.lock()?;
        Ok(tables
            .active_code_index(kind, email, code, now)
            .and_then(|idx| tables.codes.get(&kind).map(|codes| codes[idx].clone())))
    }

    async fn delete_code(&self, kind: CodeKind, id: i64) -> Result<(), anyhow::Error> {
        if let Some(codes) = self.lock()?.codes.get_mut(&kind) {
            codes.retain(|c| c.id != id);
        }
        Ok(())
    }

    async fn take_active_code(
        &self,
        kind: CodeKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralCode>, anyhow::Error> {
        let mut tables = self.lock()?;
        let Some(idx) = tables.active_code_index(kind, email, code, now) else {
            return Ok(None);
        };
        Ok(tables.codes.get_mut(&kind).map(|codes| codes.remove(idx)))
    }

    async fn purge_expired_codes(
        &self,
        kind: CodeKind,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error> {
        let mut tables = self.lock()?;
        let Some(codes) = tables.codes.get_mut(&kind) else {
            return Ok(0);
        };
        let before = codes.len();
        codes.retain(|c| !c.is_expired_at(now));
        Ok((before - codes.len()) as u64)
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create_account(
        &self,
        account: NewBankAccount,
    ) -> Result<Option<BankAccount>, anyhow::Error> {
        let mut tables = self.lock()?;
        if tables
            .accounts
            .iter()
            .any(|a| a.user_id == account.user_id && a.is_active)
        {
            return Ok(None);
        }
        if tables.accounts.iter().any(|a| a.account_no == account.account_no) {
            anyhow::bail!("duplicate account number");
        }

        let created = BankAccount {
            id: tables.next_id(),
            user_id: account.user_id,
            account_no: account.account_no,
            account_type: account.account_type,
            initial_deposit: account.initial_deposit,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.accounts.push(created.clone());
        Ok(Some(created))
    }

    async fn list_accounts(&self, user_id: i64) -> Result<Vec<BankAccount>, anyhow::Error> {
        Ok(self
            .lock()?
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id && a.is_active)
            .cloned()
            .collect())
    }

    async fn find_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<Option<BankAccount>, anyhow::Error> {
        Ok(self
            .lock()?
            .accounts
            .iter()
            .find(|a| a.user_id == user_id && a.account_no == account_no && a.is_active)
            .cloned())
    }

    async fn deactivate_account(
        &self,
        user_id: i64,
        account_no: &str,
    ) -> Result<bool, anyhow::Error> {
        let mut tables = self.lock()?;
        match tables
            .accounts
            .iter_mut()
            .find(|a| a.user_id == user_id && a.account_no == account_no && a.is_active)
        {
            Some(account) => {
                account.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl HealthCheck for InMemoryStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.lock().map(|_| ())
    }
}
