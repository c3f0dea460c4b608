// src/auth/validators.rs

use super::models::{SignInForm, SignUpForm};
use crate::common::{ValidationResult, Validator};
use crate::services::users::normalize_email;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

// ============================================================================
// Sign-up
// ============================================================================

pub struct SignUpValidator;

impl Validator<SignUpForm> for SignUpValidator {
    fn validate(&self, data: &SignUpForm) -> ValidationResult {
        let mut result = ValidationResult::new();

        let name = data.user.trim();
        let name_len = name.chars().count();
        if name.is_empty() {
            result.add_error("user", "Name is required");
        } else if !(3..=32).contains(&name_len) {
            result.add_error("user", "Name must be between 3 and 32 characters");
        } else if !is_valid_name(name) {
            result.add_error(
                "user",
                "Name may only contain letters, digits, '_' and '-'",
            );
        }

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !is_valid_email(&normalize_email(&data.email)) {
            result.add_error("email", "Email address is not valid");
        }

        let password_len = data.password.chars().count();
        if password_len < MIN_PASSWORD_LEN {
            result.add_error("password", "Password must be at least 8 characters");
        } else if password_len > MAX_PASSWORD_LEN {
            result.add_error("password", "Password must be at most 128 characters");
        } else if data.password != data.confirm_password {
            result.add_error("confirm_password", "Passwords do not match");
        }

        match NaiveDate::parse_from_str(data.date_of_birth.trim(), "%Y-%m-%d") {
            Ok(date) if date > Utc::now().date_naive() => {
                result.add_error("date_of_birth", "Date of birth cannot be in the future");
            }
            Ok(_) => {}
            Err(_) => {
                result.add_error("date_of_birth", "Date of birth must be in YYYY-MM-DD format");
            }
        }

        result
    }
}

// ============================================================================
// Sign-in
// ============================================================================

pub struct SignInValidator;

impl Validator<SignInForm> for SignInValidator {
    fn validate(&self, data: &SignInForm) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.user.trim().is_empty() {
            result.add_error("user", "Name or email is required");
        }
        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        }

        result
    }
}

fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    match EMAIL_RE.get_or_init(|| Regex::new(EMAIL_PATTERN)) {
        Ok(re) => email.len() <= 254 && re.is_match(email),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> SignUpForm {
        SignUpForm {
            user: "alice".to_string(),
            email: "Alice@Example.com ".to_string(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
            date_of_birth: "1990-04-12".to_string(),
        }
    }

    #[test]
    fn test_valid_signup() {
        let result = SignUpValidator.validate(&valid_form());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_name_rules() {
        let mut form = valid_form();
        form.user = "al".to_string();
        assert_eq!(
            SignUpValidator.validate(&form).first_message(),
            Some("Name must be between 3 and 32 characters")
        );

        form.user = "al ice".to_string();
        assert!(!SignUpValidator.validate(&form).is_valid);

        form.user = "иван_1".to_string();
        assert!(SignUpValidator.validate(&form).is_valid);
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn test_password_rules() {
        let mut form = valid_form();
        form.password = "short".to_string();
        form.confirm_password = "short".to_string();
        assert_eq!(
            SignUpValidator.validate(&form).first_message(),
            Some("Password must be at least 8 characters")
        );

        let mut form = valid_form();
        form.confirm_password = "different one".to_string();
        assert_eq!(
            SignUpValidator.validate(&form).first_message(),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn test_date_rules() {
        let mut form = valid_form();
        form.date_of_birth = "12/04/1990".to_string();
        assert!(!SignUpValidator.validate(&form).is_valid);

        form.date_of_birth = (Utc::now().date_naive() + chrono::Duration::days(2))
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(
            SignUpValidator.validate(&form).first_message(),
            Some("Date of birth cannot be in the future")
        );
    }

    #[test]
    fn test_signin_requires_both_fields() {
        let result = SignInValidator.validate(&SignInForm::default());
        assert_eq!(result.errors.len(), 2);
    }
}
