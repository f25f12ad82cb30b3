//! Request field validation
//!
//! Every check returns a [`ValidationError`] whose message is meant to be shown to the caller
//! as-is.

/// Maximum length of free-text fields
pub const MAX_TEXT_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn required(label: &str) -> Self {
        Self(format!("{label} is required"))
    }

    pub fn max_length(label: &str, max: usize) -> Self {
        Self(format!("{label} must be at most {max} characters"))
    }

    pub fn email(label: &str) -> Self {
        Self(format!("{label} must be a valid email address"))
    }

    pub fn invalid_format(label: &str) -> Self {
        Self(format!("{label} invalid format"))
    }
}

/// Identifiers and quantities are required to be strictly positive
pub fn require_positive(label: &str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::required(label));
    }
    Ok(())
}

pub fn require_non_negative(label: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::invalid_format(label));
    }
    Ok(())
}

/// Non-blank text of at most [`MAX_TEXT_LENGTH`] characters
pub fn require_text(label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(label));
    }
    max_length(label, value)
}

/// Optional text of at most [`MAX_TEXT_LENGTH`] characters
pub fn max_length(label: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::max_length(label, MAX_TEXT_LENGTH));
    }
    Ok(())
}

pub fn require_email(label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(label));
    }
    if !is_valid_email(value) {
        return Err(ValidationError::email(label));
    }
    max_length(label, value)
}

/// Structural email check: one `@`, a non-empty local part and a dotted domain
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local)
        && domain.chars().all(valid_domain)
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_require_positive_rejects(#[case] value: i64) {
        let res = require_positive("quantity", value);

        assert_that!(res)
            .is_err()
            .is_equal_to(ValidationError("quantity is required".to_string()));
    }

    #[test]
    fn test_require_positive_accepts() {
        assert_that!(require_positive("quantity", 1)).is_ok();
    }

    #[test]
    fn test_require_non_negative() {
        assert_that!(require_non_negative("customerPoints", 0)).is_ok();
        assert_that!(require_non_negative("customerPoints", -5))
            .is_err()
            .is_equal_to(ValidationError::invalid_format("customerPoints"));
    }

    #[rstest]
    #[case("", "name is required")]
    #[case("   ", "name is required")]
    fn test_require_text_blank(#[case] value: &str, #[case] expected: &str) {
        let res = require_text("name", value);

        assert_that!(res.unwrap_err().to_string().as_str()).is_equal_to(expected);
    }

    #[test]
    fn test_max_length() {
        let at_limit = "a".repeat(MAX_TEXT_LENGTH);
        let over_limit = "a".repeat(MAX_TEXT_LENGTH + 1);

        assert_that!(max_length("description", &at_limit)).is_ok();
        assert_that!(max_length("description", &over_limit).unwrap_err().to_string().as_str())
            .is_equal_to("description must be at most 255 characters");
    }

    #[rstest]
    #[case("user@example.com")]
    #[case("first.last+tag@mail.example.co")]
    fn test_require_email_valid(#[case] email: &str) {
        assert_that!(require_email("email", email)).is_ok();
    }

    #[rstest]
    #[case("invalid")]
    #[case("@example.com")]
    #[case("user@")]
    #[case("user@localhost")]
    #[case("user@@example.com")]
    #[case("user@example..com")]
    fn test_require_email_invalid(#[case] email: &str) {
        assert_that!(require_email("email", email))
            .is_err()
            .is_equal_to(ValidationError::email("email"));
    }

    #[test]
    fn test_require_email_missing() {
        assert_that!(require_email("email", ""))
            .is_err()
            .is_equal_to(ValidationError::required("email"));
    }
}
