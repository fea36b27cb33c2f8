use std::sync::Arc;

use crate::config::CodeConfig;
use crate::dtos::auth::RegisterRequest;
use crate::models::{CodeKind, NewUser, UserSnapshot};
use crate::services::{
    EphemeralCodeStore, Mailer, OutgoingEmail, ServiceError, SessionTokenService, UserRepository,
};
use crate::utils::{CredentialHasher, CredentialSecret, Password};

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in: i64,
    pub user: UserSnapshot,
}

/// Registration, login and the one-time-code flows.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    codes: EphemeralCodeStore,
    hasher: CredentialHasher,
    sessions: SessionTokenService,
    mailer: Arc<dyn Mailer>,
    otp_length: usize,
    reset_token_length: usize,
    // Verified against when the account is unknown so both paths do the same work.
    decoy_secret: CredentialSecret,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        codes: EphemeralCodeStore,
        hasher: CredentialHasher,
        sessions: SessionTokenService,
        mailer: Arc<dyn Mailer>,
        config: &CodeConfig,
    ) -> Self {
        let decoy_secret = hasher.hash_with_salt(&Password::new(""), &"0".repeat(64));
        Self {
            users,
            codes,
            hasher,
            sessions,
            mailer,
            otp_length: config.otp_length,
            reset_token_length: config.reset_token_length,
            decoy_secret,
        }
    }

    pub fn sessions(&self) -> &SessionTokenService {
        &self.sessions
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserSnapshot, ServiceError> {
        if self.users.find_user_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let secret = self.hasher.hash(&Password::new(req.password))?;
        let user = self
            .users
            .create_user(NewUser {
                username: req.username.trim().to_string(),
                email: req.email.clone(),
                password: secret.into_string(),
                phone_no: req.phone_number.trim().to_string(),
            })
            .await?
            .ok_or(ServiceError::EmailAlreadyRegistered)?;

        tracing::info!(user_id = user.id, email = %user.email, "User registered");

        self.send_verification_code(&user.email, &user.username).await?;

        Ok(user.snapshot())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, ServiceError> {
        let password = Password::new(password);

        let Some(user) = self.users.find_user_by_email(email).await? else {
            let _ = self.hasher.verify(&password, self.decoy_secret.as_str());
            tracing::warn!(email = %email, "Login attempt for unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(&password, &user.password) {
            tracing::warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let snapshot = user.snapshot();
        let token = self.sessions.issue(&snapshot)?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(IssuedSession {
            token,
            expires_in: self.sessions.ttl_seconds(),
            user: snapshot,
        })
    }

    /// Sends a fresh OTP when the account exists and is not yet active.
    pub async fn request_email_verification(&self, email: &str) -> Result<(), ServiceError> {
        match self.users.find_user_by_email(email).await? {
            Some(user) if !user.is_active => {
                self.send_verification_code(&user.email, &user.username)
                    .await
            }
            Some(_) => {
                tracing::debug!(email = %email, "Verification requested for active account");
                Ok(())
            }
            None => {
                tracing::debug!(email = %email, "Verification requested for unknown account");
                Ok(())
            }
        }
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<UserSnapshot, ServiceError> {
        self.codes
            .consume(CodeKind::EmailVerification, email, otp.trim())
            .await?
            .ok_or(ServiceError::InvalidOrExpiredCode)?;

        if !self.users.activate_user(email).await? {
            return Err(ServiceError::InvalidOrExpiredCode);
        }

        let user = self
            .users
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        tracing::info!(user_id = user.id, "Email verified");

        if let Err(e) = self
            .mailer
            .send(OutgoingEmail::welcome(&user.email, &user.username))
            .await
        {
            tracing::error!(error = %e, user_id = user.id, "Failed to send welcome email");
        }

        Ok(user.snapshot())
    }

    /// Sends a reset token when the account exists. Silent otherwise.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            tracing::debug!(email = %email, "Password reset requested for unknown account");
            return Ok(());
        };

        let record = self
            .codes
            .generate_and_store(CodeKind::PasswordReset, &user.email, self.reset_token_length)
            .await?;

        self.deliver(OutgoingEmail::password_reset(
            &user.email,
            &record.code,
            self.codes.ttl_minutes(),
        ))
        .await;

        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        self.codes
            .consume(CodeKind::PasswordReset, email, token.trim())
            .await?
            .ok_or(ServiceError::InvalidOrExpiredCode)?;

        let secret = self.hasher.hash(&Password::new(new_password))?;
        if !self.users.update_password(email, secret.as_str()).await? {
            return Err(ServiceError::InvalidOrExpiredCode);
        }

        tracing::info!(email = %email, "Password reset completed");
        Ok(())
    }

    async fn send_verification_code(&self, email: &str, username: &str) -> Result<(), ServiceError> {
        let record = self
            .codes
            .generate_and_store(CodeKind::EmailVerification, email, self.otp_length)
            .await?;

        self.deliver(OutgoingEmail::verification_code(
            email,
            username,
            &record.code,
            self.codes.ttl_minutes(),
        ))
        .await;

        Ok(())
    }

    // Delivery failures are logged; the code stays valid and can be re-requested.
    async fn deliver(&self, email: OutgoingEmail) {
        let to = email.to.clone();
        if let Err(e) = self.mailer.send(email).await {
            tracing::error!(error = %e, to = %to, "Failed to deliver one-time code");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsumeMode, ServerKey, SessionConfig};
    use crate::services::{InMemoryStore, RecordingMailer};

    struct Harness {
        store: Arc<InMemoryStore>,
        mailer: Arc<RecordingMailer>,
        auth: AuthService,
    }

    fn harness() -> Harness {
        let key = ServerKey::new("unit-test-key");
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let code_config = CodeConfig {
            ttl_minutes: 60,
            otp_length: 4,
            reset_token_length: 6,
            consume_mode: ConsumeMode::Atomic,
            reap_interval_seconds: 900,
        };
        let auth = AuthService::new(
            store.clone(),
            EphemeralCodeStore::new(store.clone(), &code_config),
            CredentialHasher::new(key.clone()),
            SessionTokenService::new(
                &key,
                &SessionConfig {
                    issuer: "tap_gopay".to_string(),
                    ttl_hours: 24,
                    cookie_name: "login".to_string(),
                },
            ),
            mailer.clone(),
            &code_config,
        );
        Harness {
            store,
            mailer,
            auth,
        }
    }

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: email.to_string(),
            password: "Sup3r$ecret!".to_string(),
            phone_number: "0712345678".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_secret_and_sends_otp() {
        let h = harness();
        let user = h.auth.register(registration("alice@example.com")).await.unwrap();
        assert!(!user.is_active);

        let stored = h
            .store
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.password.trim_matches('$').split('$').count(), 3);
        assert_ne!(stored.password, "Sup3r$ecret!");

        let codes = h.store.codes_for(CodeKind::EmailVerification, "alice@example.com");
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code.len(), 4);

        let mail = h.mailer.last_to("alice@example.com").unwrap();
        assert!(mail.body.contains(&codes[0].code));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let h = harness();
        h.auth.register(registration("alice@example.com")).await.unwrap();

        let err = h.auth.register(registration("alice@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        h.auth.register(registration("alice@example.com")).await.unwrap();

        let unknown = h.auth.login("nobody@example.com", "Sup3r$ecret!").await.unwrap_err();
        let wrong = h.auth.login("alice@example.com", "Wr0ng$ecret!").await.unwrap_err();

        assert!(matches!(unknown, ServiceError::InvalidCredentials));
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_token_carries_email() {
        let h = harness();
        h.auth.register(registration("alice@example.com")).await.unwrap();

        let session = h.auth.login("alice@example.com", "Sup3r$ecret!").await.unwrap();
        let claims = h.auth.sessions().verify(&session.token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(session.expires_in, 24 * 3600);
    }

    #[tokio::test]
    async fn test_verify_email_activates_once() {
        let h = harness();
        h.auth.register(registration("alice@example.com")).await.unwrap();
        let otp = h.store.codes_for(CodeKind::EmailVerification, "alice@example.com")[0]
            .code
            .clone();

        let user = h.auth.verify_email("alice@example.com", &otp).await.unwrap();
        assert!(user.is_active);
        assert_eq!(
            h.mailer.last_to("alice@example.com").unwrap().subject,
            "Welcome To TapGoPay"
        );

        let err = h.auth.verify_email("alice@example.com", &otp).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOrExpiredCode));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let h = harness();
        h.auth.register(registration("alice@example.com")).await.unwrap();

        h.auth.request_password_reset("alice@example.com").await.unwrap();
        h.auth.request_password_reset("nobody@example.com").await.unwrap();

        let token = h.store.codes_for(CodeKind::PasswordReset, "alice@example.com")[0]
            .code
            .clone();
        assert_eq!(token.len(), 6);
        assert!(h.mailer.last_to("nobody@example.com").is_none());

        h.auth
            .confirm_password_reset("alice@example.com", &token, "N3w$ecret!!")
            .await
            .unwrap();

        assert!(h.auth.login("alice@example.com", "N3w$ecret!!").await.is_ok());
        assert!(h.auth.login("alice@example.com", "Sup3r$ecret!").await.is_err());
    }
}
