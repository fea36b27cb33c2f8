//! Declarative field validation.
//!
//! An input type lists its fields as static [`FieldSpec`] tables, each with an
//! ordered slice of [`Rule`]s, and hands the engine the current value of every
//! field through [`Validate::fields`]. The engine never inspects the type
//! itself.
//!
//! Every rule of a field is evaluated in declaration order. A later failure
//! replaces an earlier one in the error map, so the message reported for a
//! field is the one from its *last* failing rule.

mod rules;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use rules::{MIN_PASSWORD_LEN, is_valid_email};

/// Field display name -> message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// A single validation directive attached to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// String must not be blank.
    Required,
    /// Minimum trimmed length for strings, minimum value for numbers.
    Min(i64),
    /// Maximum trimmed length for strings, maximum value for numbers.
    Max(i64),
    Email,
    /// At least [`MIN_PASSWORD_LEN`] characters.
    Password,
    /// `Password` plus upper case, lower case and a non-alphanumeric character.
    StrongPassword,
    /// Domain enumeration: the string must be one of `allowed`.
    OneOf {
        allowed: &'static [&'static str],
        message: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unknown rule token '{0}'")]
    UnknownRule(String),
    #[error("invalid bound in rule token '{0}'")]
    InvalidBound(String),
}

impl FromStr for Rule {
    type Err = RuleParseError;

    /// Parses the built-in tokens (`required`, `min=N`, `max=N`, `email`,
    /// `password`, `password=strict`). Domain enumerations have no token form.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let bound = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| RuleParseError::InvalidBound(token.to_string()))
        };

        match token {
            "required" => Ok(Rule::Required),
            "email" => Ok(Rule::Email),
            "password" => Ok(Rule::Password),
            "password=strict" => Ok(Rule::StrongPassword),
            _ => {
                if let Some(raw) = token.strip_prefix("min=") {
                    Ok(Rule::Min(bound(raw)?))
                } else if let Some(raw) = token.strip_prefix("max=") {
                    Ok(Rule::Max(bound(raw)?))
                } else {
                    Err(RuleParseError::UnknownRule(token.to_string()))
                }
            }
        }
    }
}

impl Rule {
    /// Returns the failure message, if `value` breaks this rule.
    pub fn check(&self, field: &str, value: FieldValue<'_>) -> Option<String> {
        match (self, value) {
            (Rule::Required, FieldValue::Str(s)) => {
                s.trim().is_empty().then(|| format!("{} is required", field))
            }
            (Rule::Required, _) => None,

            (Rule::Min(n), FieldValue::Int(v)) => {
                (v < *n).then(|| format!("{} must be at least {}", field, n))
            }
            (Rule::Min(n), FieldValue::Float(v)) => {
                (v < *n as f64).then(|| format!("{} must be at least {}", field, n))
            }
            (Rule::Min(n), FieldValue::Str(s)) => ((s.trim().chars().count() as i64) < *n)
                .then(|| format!("{} must be at least {} characters long", field, n)),

            (Rule::Max(n), FieldValue::Int(v)) => {
                (v > *n).then(|| format!("{} must be at most {}", field, n))
            }
            (Rule::Max(n), FieldValue::Float(v)) => {
                (v > *n as f64).then(|| format!("{} must be at most {}", field, n))
            }
            (Rule::Max(n), FieldValue::Str(s)) => ((s.trim().chars().count() as i64) > *n)
                .then(|| format!("{} must be at most {} characters long", field, n)),
            (Rule::Min(_) | Rule::Max(_), FieldValue::Bool(_)) => None,

            (Rule::Email, FieldValue::Str(s)) => rules::check_email(field, s),
            (Rule::Password, FieldValue::Str(s)) => rules::check_password(field, s, false),
            (Rule::StrongPassword, FieldValue::Str(s)) => rules::check_password(field, s, true),
            (Rule::OneOf { allowed, message }, FieldValue::Str(s)) => {
                (!allowed.contains(&s)).then(|| message.to_string())
            }
            (Rule::Email | Rule::Password | Rule::StrongPassword | Rule::OneOf { .. }, _) => {
                Some(format!("{} must be a string", field))
            }
        }
    }
}

/// Static description of one input field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Internal (Rust) field name.
    pub name: &'static str,
    /// Name the field carries on the wire, when it differs.
    pub wire_name: Option<&'static str>,
    pub rules: &'static [Rule],
}

impl FieldSpec {
    pub const fn new(name: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            name,
            wire_name: None,
            rules,
        }
    }

    pub const fn wire(self, wire_name: &'static str) -> Self {
        Self {
            wire_name: Some(wire_name),
            ..self
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.wire_name.unwrap_or(self.name)
    }
}

/// Borrowed view of a field's current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Str(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Str(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        FieldValue::Str(value.as_deref().unwrap_or(""))
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Implemented by every input type that carries a rule table.
pub trait Validate {
    /// Each declared field paired with its current value.
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)>;

    fn validate(&self) -> FieldErrors {
        validate_fields(self.fields())
    }
}

/// Sequences report the errors of their first invalid element only.
impl<T: Validate> Validate for Vec<T> {
    fn fields(&self) -> Vec<(&'static FieldSpec, FieldValue<'_>)> {
        Vec::new()
    }

    fn validate(&self) -> FieldErrors {
        validate_each(self)
    }
}

pub fn validate_fields<'a, I>(fields: I) -> FieldErrors
where
    I: IntoIterator<Item = (&'static FieldSpec, FieldValue<'a>)>,
{
    let mut errs = FieldErrors::new();

    for (spec, value) in fields {
        let name = spec.display_name();
        for rule in spec.rules {
            if let Some(message) = rule.check(name, value) {
                errs.insert(name, message);
            }
        }
    }

    errs
}

pub fn validate_each<T: Validate>(items: &[T]) -> FieldErrors {
    items
        .iter()
        .map(Validate::validate)
        .find(|errs| !errs.is_empty())
        .unwrap_or_default()
}
