use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::ServerKey;

type HmacSha256 = Hmac<Sha256>;

/// Tag written in the first field of every credential secret.
pub const ALGORITHM_TAG: &str = "5";

/// Random salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Stored form of a password: `$<tag>$<hex(salt)>$<hex(mac)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSecret(String);

impl CredentialSecret {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Salted HMAC-SHA256 password hashing keyed with the server key.
#[derive(Clone)]
pub struct CredentialHasher {
    key: ServerKey,
}

impl CredentialHasher {
    pub fn new(key: ServerKey) -> Self {
        Self { key }
    }

    /// Hash with a fresh random salt.
    pub fn hash(&self, password: &Password) -> Result<CredentialSecret, anyhow::Error> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| anyhow::anyhow!("Failed to generate salt: {}", e))?;

        Ok(self.hash_with_salt(password, &hex::encode(salt)))
    }

    /// Deterministic for a given `(salt, password, key)`.
    pub fn hash_with_salt(&self, password: &Password, salt_hex: &str) -> CredentialSecret {
        let digest = self.digest(password, salt_hex);
        CredentialSecret::new(format!(
            "${}${}${}",
            ALGORITHM_TAG,
            salt_hex,
            hex::encode(digest)
        ))
    }

    /// Fails closed: a malformed or foreign secret never verifies.
    pub fn verify(&self, password: &Password, stored: &str) -> bool {
        let fields: Vec<&str> = stored.trim_matches('$').split('$').collect();
        let [tag, salt_hex, mac_hex] = fields.as_slice() else {
            tracing::warn!("Stored credential secret has an unexpected shape");
            return false;
        };

        if *tag != ALGORITHM_TAG {
            tracing::warn!(tag = %tag, "Stored credential secret uses an unknown algorithm");
            return false;
        }

        let Ok(expected) = hex::decode(mac_hex) else {
            return false;
        };

        let actual = self.digest(password, salt_hex);
        actual.ct_eq(expected.as_slice()).into()
    }

    fn digest(&self, password: &Password, salt_hex: &str) -> Vec<u8> {
        // HMAC accepts keys of any length.
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.key.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(salt_hex.as_bytes());
        mac.update(b".");
        mac.update(password.as_str().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}
