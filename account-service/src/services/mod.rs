//! Services layer for account-service.
//!
//! Credential hashing lives in `utils::password`; everything here is either a
//! core component (session tokens, one-time codes), a persistence adapter or
//! the orchestration the handlers call.

mod accounts;
mod auth;
pub mod codes;
mod database;
mod email;
pub mod error;
mod memory;
mod repository;
pub mod session;

pub use accounts::{generate_account_no, AccountService};
pub use auth::{AuthService, IssuedSession};
pub use codes::{generate_code, EphemeralCodeStore};
pub use database::Database;
pub use email::{Mailer, OutgoingEmail, RecordingMailer, SmtpMailer};
pub use error::ServiceError;
pub use memory::InMemoryStore;
pub use repository::{AccountRepository, CodeRepository, HealthCheck, UserRepository};
pub use session::{extract_subject, SessionClaims, SessionTokenService, SnapshotError};
