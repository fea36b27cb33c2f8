pub mod password;
pub mod validation;

pub use password::{CredentialHasher, CredentialSecret, Password};
pub use validation::ValidatedJson;
