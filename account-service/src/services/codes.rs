use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::{CodeConfig, ConsumeMode};
use crate::models::{CodeKind, EphemeralCode, NewEphemeralCode};
use crate::services::{CodeRepository, ServiceError};

/// `length` decimal digits from the OS CSPRNG.
pub fn generate_code(length: usize) -> Result<String, ServiceError> {
    let mut code = String::with_capacity(length);
    let mut buf = [0u8; 16];

    while code.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| ServiceError::CodeGeneration(e.to_string()))?;

        // Bytes >= 250 are dropped so every digit is equally likely.
        for byte in buf.iter().filter(|b| **b < 250) {
            if code.len() == length {
                break;
            }
            code.push(char::from(b'0' + byte % 10));
        }
    }

    Ok(code)
}

/// Short-lived single-use codes on top of a [`CodeRepository`].
#[derive(Clone)]
pub struct EphemeralCodeStore {
    repo: Arc<dyn CodeRepository>,
    ttl: Duration,
    mode: ConsumeMode,
}

impl EphemeralCodeStore {
    pub fn new(repo: Arc<dyn CodeRepository>, config: &CodeConfig) -> Self {
        Self {
            repo,
            ttl: Duration::minutes(config.ttl_minutes),
            mode: config.consume_mode,
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    pub async fn generate_and_store(
        &self,
        kind: CodeKind,
        email: &str,
        length: usize,
    ) -> Result<EphemeralCode, ServiceError> {
        let code = generate_code(length)?;
        let record = self
            .repo
            .insert_code(
                kind,
                NewEphemeralCode {
                    email: email.to_string(),
                    code,
                    expires_at: Utc::now() + self.ttl,
                },
            )
            .await?;

        tracing::info!(kind = kind.as_str(), email = %email, "Issued one-time code");
        Ok(record)
    }

    /// Returns the matching unexpired record and removes it, or `None`.
    pub async fn consume(
        &self,
        kind: CodeKind,
        email: &str,
        presented: &str,
    ) -> Result<Option<EphemeralCode>, ServiceError> {
        let now = Utc::now();

        match self.mode {
            ConsumeMode::Atomic => Ok(self
                .repo
                .take_active_code(kind, email, presented, now)
                .await?),
            ConsumeMode::Detached => {
                let Some(record) = self
                    .repo
                    .find_active_code(kind, email, presented, now)
                    .await?
                else {
                    return Ok(None);
                };

                let repo = Arc::clone(&self.repo);
                let id = record.id;
                tokio::spawn(async move {
                    if let Err(e) = repo.delete_code(kind, id).await {
                        tracing::error!(
                            kind = kind.as_str(),
                            code_id = id,
                            error = %e,
                            "Failed to delete consumed code"
                        );
                    }
                });

                Ok(Some(record))
            }
        }
    }

    /// Delete every expired code of every kind.
    pub async fn reap_expired(&self) -> Result<u64, ServiceError> {
        let now = Utc::now();
        let mut purged = 0;
        for kind in [CodeKind::EmailVerification, CodeKind::PasswordReset] {
            purged += self.repo.purge_expired_codes(kind, now).await?;
        }
        Ok(purged)
    }

    pub fn spawn_reaper(&self, every: std::time::Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match store.reap_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Reaped expired one-time codes"),
                    Err(e) => tracing::error!(error = %e, "Failed to reap expired codes"),
                }
            }
        })
    }
}
