//! HTTP handlers for account-service.

pub mod accounts;
pub mod auth;
pub mod user;

pub use accounts::*;
pub use auth::*;
pub use user::*;
