pub mod bank_account;
pub mod ephemeral_code;
pub mod user;

pub use bank_account::{BankAccount, NewBankAccount, ACCOUNT_TYPES};
pub use ephemeral_code::{CodeKind, EphemeralCode, NewEphemeralCode};
pub use user::{NewUser, User, UserSnapshot};
