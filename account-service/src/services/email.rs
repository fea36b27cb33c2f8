use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn verification_code(to: &str, username: &str, code: &str, ttl_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: "TapGoPay Email Verification".to_string(),
            body: format!(
                "Hello {},\n\nYour verification code is {}.\n\n\
                 It expires in {} minutes. If you did not sign up, ignore this email.",
                username, code, ttl_minutes
            ),
        }
    }

    pub fn password_reset(to: &str, token: &str, ttl_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: "TapGoPay Password Reset".to_string(),
            body: format!(
                "We received a request to reset your password.\n\n\
                 Your reset code is {}. It expires in {} minutes.\n\n\
                 If you did not request this, ignore this email.",
                token, ttl_minutes
            ),
        }
    }

    pub fn welcome(to: &str, username: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome To TapGoPay".to_string(),
            body: format!(
                "Hello {},\n\nYour email address is verified. Welcome to TapGoPay!",
                username
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}

/// SMTP delivery. Authenticates over TLS when a username is configured,
/// otherwise talks plain SMTP to a local relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let transport = if config.username.is_empty() {
            SmtpTransport::builder_dangerous(&config.host)
                .port(config.port)
                .timeout(Some(Duration::from_secs(10)))
                .build()
        } else {
            SmtpTransport::relay(&config.host)
                .map_err(|e| AppError::EmailError(e.to_string()))?
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
                .port(config.port)
                .timeout(Some(Duration::from_secs(10)))
                .build()
        };

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer initialized");

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)?;

        // SmtpTransport blocks; keep it off the async workers.
        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %email.to, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// Keeps every message in memory instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent().into_iter().rev().find(|e| e.to == to)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        tracing::debug!(to = %email.to, subject = %email.subject, "Recording email");
        self.sent
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mailer mutex poisoned: {}", e)))?
            .push(email);
        Ok(())
    }
}
