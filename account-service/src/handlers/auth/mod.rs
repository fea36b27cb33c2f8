pub mod password;
pub mod registration;
pub mod session;

pub use password::{confirm_password_reset, request_password_reset};
pub use registration::{request_email_verification, signup, verify_email};
pub use session::login;
