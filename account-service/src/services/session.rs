use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ServerKey, SessionConfig};
use crate::models::UserSnapshot;
use crate::services::ServiceError;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user email)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Base64 (no padding) JSON user snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("session token carries no user snapshot")]
    Missing,
    #[error("user snapshot is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("user snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Issues and verifies stateless HS256 session tokens.
///
/// A token stays valid until it expires. There is no server-side record, so a
/// single session cannot be revoked short of rotating the server key, and the
/// embedded snapshot reflects the user at login time.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl SessionTokenService {
    pub fn new(key: &ServerKey, config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            issuer: config.issuer.clone(),
            ttl: Duration::hours(config.ttl_hours),
        }
    }

    pub fn issue(&self, snapshot: &UserSnapshot) -> Result<String, ServiceError> {
        self.issue_at(snapshot, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        snapshot: &UserSnapshot,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let payload = serde_json::to_vec(snapshot)
            .map_err(|e| anyhow::anyhow!("Failed to serialize user snapshot: {}", e))?;

        let claims = SessionClaims {
            sub: snapshot.email.clone(),
            iss: self.issuer.clone(),
            usr: Some(STANDARD_NO_PAD.encode(payload)),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Rejects a bad signature, a foreign issuer or a past expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

/// Decode the snapshot embedded in verified claims.
pub fn extract_subject<T: DeserializeOwned>(claims: &SessionClaims) -> Result<T, SnapshotError> {
    let encoded = claims.usr.as_deref().ok_or(SnapshotError::Missing)?;
    let bytes = STANDARD_NO_PAD.decode(encoded)?;
    Ok(serde_json::from_slice(&bytes)?)
}
