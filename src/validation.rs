//! Form validation helpers shared by the handlers and the auth workflow.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::FieldErrors;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;

/// Collects the first error reported for each field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str, message: impl Into<String>) -> &mut Self {
        self.check(field, !value.trim().is_empty(), message)
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain with
/// no empty labels, and no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

pub fn validate_username(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        Some("Username is required")
    } else if username.len() < USERNAME_MIN {
        Some("Username must be at least 3 characters long")
    } else if username.len() > USERNAME_MAX {
        Some("Username must be less than 30 characters")
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some("Username can only contain letters, numbers, dots, dashes, and underscores")
    } else {
        None
    }
}

pub fn validate_password_strength(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.chars().count() < PASSWORD_MIN {
        Some("Password must be at least 8 characters long")
    } else if !(password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit()))
    {
        Some("Password must contain at least one uppercase letter, one lowercase letter, and one number")
    } else {
        None
    }
}

/// Trimmed value, `None` when blank.
pub fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim().replace(',', "").as_str()).ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_int<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.ke"));
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "alice", "alice@", "@example.com", "alice@example", "a b@example.com", "a@b@c.com", "alice@-x.com"] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn username_rules() {
        assert_eq!(validate_username("alice"), None);
        assert_eq!(validate_username("a.b-c_d"), None);
        assert!(validate_username("al").is_some());
        assert!(validate_username(&"a".repeat(31)).is_some());
        assert_eq!(validate_username(&"a".repeat(30)), None);
        assert!(validate_username("alice smith").is_some());
    }

    #[test]
    fn password_strength_rules() {
        assert_eq!(validate_password_strength("Passw0rd1"), None);
        assert_eq!(validate_password_strength("Sh0rt"), Some("Password must be at least 8 characters long"));
        assert!(validate_password_strength("alllowercase1").is_some());
        assert!(validate_password_strength("ALLUPPERCASE1").is_some());
        assert!(validate_password_strength("NoDigitsHere").is_some());
    }

    #[test]
    fn validator_keeps_first_error_per_field() {
        let mut v = Validator::new();
        v.required("name", "  ", "Name is required");
        v.add("name", "second message");
        v.check("email", true, "unused");
        assert!(v.has("name"));
        assert!(!v.has("email"));
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["name"], "Name is required");
    }

    #[test]
    fn parses_form_numbers_and_dates() {
        assert_eq!(parse_decimal("15,000.50"), Some(Decimal::new(1500050, 2)));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("29/02/2024"), None);
        assert_eq!(parse_int::<i32>(" 3 "), Some(3));
        assert_eq!(optional(&Some("  ".into())), None);
        assert_eq!(optional(&Some(" x ".into())), Some("x".into()));
    }
}
