use serde::Deserialize;
use service_core::validation::{FieldSpec, FieldValue, Rule, Validate};

use crate::models::ACCOUNT_TYPES;

static ACCOUNT_TYPE: FieldSpec = FieldSpec::new(
    "account_type",
    &[Rule::OneOf {
        allowed: ACCOUNT_TYPES,
        message: "Invalid account type. Valid account types include: ['user','agent','admin']",
    }],
);
static INITIAL_DEPOSIT: FieldSpec = FieldSpec::new("initial_deposit", &[Rule::Min(100)]);

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub initial_deposit: f64,
}

impl Validate for CreateAccountRequest {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        vec![
            (&ACCOUNT_TYPE, (&self.account_type).into()),
            (&INITIAL_DEPOSIT, self.initial_deposit.into()),
        ]
    }
}
