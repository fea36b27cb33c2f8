use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

use crate::dtos::accounts::CreateAccountRequest;
use crate::models::{BankAccount, NewBankAccount, UserSnapshot};
use crate::services::{AccountRepository, ServiceError};

/// Account numbers are the hex encoding of this many random bytes.
const ACCOUNT_NO_BYTES: usize = 32;

pub fn generate_account_no() -> Result<String, ServiceError> {
    let mut buf = [0u8; ACCOUNT_NO_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| ServiceError::CodeGeneration(e.to_string()))?;
    Ok(hex::encode(buf))
}

/// Bank accounts owned by the caller. A user holds at most one active account.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    pub async fn open(
        &self,
        owner: &UserSnapshot,
        req: CreateAccountRequest,
    ) -> Result<BankAccount, ServiceError> {
        let account = self
            .repo
            .create_account(NewBankAccount {
                user_id: owner.id,
                account_no: generate_account_no()?,
                account_type: req.account_type,
                initial_deposit: req.initial_deposit,
            })
            .await?
            .ok_or(ServiceError::AccountAlreadyExists)?;

        tracing::info!(
            user_id = owner.id,
            account_type = %account.account_type,
            "Bank account opened"
        );
        Ok(account)
    }

    pub async fn list(&self, owner: &UserSnapshot) -> Result<Vec<BankAccount>, ServiceError> {
        Ok(self.repo.list_accounts(owner.id).await?)
    }

    pub async fn get(
        &self,
        owner: &UserSnapshot,
        account_no: &str,
    ) -> Result<BankAccount, ServiceError> {
        self.repo
            .find_account(owner.id, account_no.trim())
            .await?
            .ok_or(ServiceError::AccountNotFound)
    }

    pub async fn close(&self, owner: &UserSnapshot, account_no: &str) -> Result<(), ServiceError> {
        if !self.repo.deactivate_account(owner.id, account_no.trim()).await? {
            return Err(ServiceError::AccountNotFound);
        }
        tracing::info!(user_id = owner.id, "Bank account deactivated");
        Ok(())
    }
}
