use serde::{Deserialize, Serialize};
use service_core::validation::{FieldSpec, FieldValue, Rule, Validate};

use crate::models::UserSnapshot;

static USERNAME: FieldSpec = FieldSpec::new("username", &[Rule::Required, Rule::Min(3), Rule::Max(50)]);
static EMAIL: FieldSpec = FieldSpec::new("email", &[Rule::Email]);
static PASSWORD: FieldSpec = FieldSpec::new("password", &[Rule::Password]);
static STRONG_PASSWORD: FieldSpec = FieldSpec::new("password", &[Rule::StrongPassword]);
static PHONE_NUMBER: FieldSpec =
    FieldSpec::new("phone_number", &[Rule::Required, Rule::Min(9)]).wire("phone_no");
static OTP: FieldSpec = FieldSpec::new("otp", &[Rule::Required]);
static RESET_TOKEN: FieldSpec = FieldSpec::new("token", &[Rule::Required]);
static NEW_PASSWORD: FieldSpec = FieldSpec::new("new_password", &[Rule::StrongPassword]);

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "phone_no")]
    pub phone_number: String,
}

impl Validate for RegisterRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![
            (&USERNAME, (&self.username).into()),
            (&EMAIL, (&self.email).into()),
            (&STRONG_PASSWORD, (&self.password).into()),
            (&PHONE_NUMBER, (&self.phone_number).into()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![
            (&EMAIL, (&self.email).into()),
            (&PASSWORD, (&self.password).into()),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserSnapshot,
}

/// Body of the endpoints that only need an address.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

impl Validate for EmailRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![(&EMAIL, (&self.email).into())]
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

impl Validate for VerifyEmailRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![
            (&EMAIL, (&self.email).into()),
            (&OTP, (&self.otp).into()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

impl Validate for PasswordResetConfirmRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![
            (&EMAIL, (&self.email).into()),
            (&RESET_TOKEN, (&self.token).into()),
            (&NEW_PASSWORD, (&self.new_password).into()),
        ]
    }
}
