use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length accepted by the `password` rule.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+[.][A-Za-z.]{2,}$")
        .expect("email pattern is a valid regex")
});

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

pub(crate) fn check_email(field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} field is required", field));
    }
    if !is_valid_email(value) {
        return Some("invalid email format".to_string());
    }
    None
}

pub(crate) fn check_password(field: &str, value: &str, strict: bool) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} field is required", field));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "{} cannot be less than {} characters long",
            field, MIN_PASSWORD_LEN
        ));
    }
    if strict {
        if !value.chars().any(|c| !c.is_ascii_alphanumeric()) {
            return Some(format!(
                "{} must contain at least one special character",
                field
            ));
        }
        let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
        if !(has_upper && has_lower) {
            return Some(format!(
                "{} must contain at least one uppercase and one lowercase letter",
                field
            ));
        }
    }
    None
}
