//! Per-endpoint input validation.
//!
//! Each endpoint has an explicit, ordered list of named rules. A rule
//! inspects the raw request and may contribute one `field -> message` entry;
//! rules are applied sequentially and the first message per field wins.

use std::collections::BTreeMap;

use super::types::{LoginRequest, RegisterRequest};
use super::utils::{normalize_email, valid_email};

pub(super) type FieldErrors = BTreeMap<String, String>;

type RegistrationRule = fn(&RegisterRequest) -> Option<(&'static str, &'static str)>;

const REGISTRATION_RULES: &[RegistrationRule] = &[
    require_first_name,
    require_last_name,
    require_email,
    email_format,
    require_password,
    password_length,
    require_confirm_password,
    passwords_match,
];

/// Apply the registration rules in order. An empty map means the input is
/// valid (email uniqueness is checked separately, against the directory).
pub(super) fn validate_registration(request: &RegisterRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in REGISTRATION_RULES {
        if let Some((field, message)) = rule(request) {
            errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
    }
    errors
}

/// Apply the login rules in order. Callers collapse any error into the
/// uniform "Invalid email or password" response; the per-field details only
/// exist for logging.
pub(super) fn validate_login(request: &LoginRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let email = normalize_email(&request.email);
    if email.is_empty() {
        errors.insert("email".to_string(), "Please enter your email".to_string());
    } else if !valid_email(&email) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email".to_string(),
        );
    }
    if request.password.is_empty() {
        errors.insert(
            "password".to_string(),
            "Please enter your password".to_string(),
        );
    }
    errors
}

fn require_first_name(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if request.first_name.trim().is_empty() {
        Some(("first_name", "Please enter your first name"))
    } else {
        None
    }
}

fn require_last_name(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if request.last_name.trim().is_empty() {
        Some(("last_name", "Please enter your last name"))
    } else {
        None
    }
}

fn require_email(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if request.email.trim().is_empty() {
        Some(("email", "Please enter your email"))
    } else {
        None
    }
}

fn email_format(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    let email = normalize_email(&request.email);
    if email.is_empty() || valid_email(&email) {
        None
    } else {
        Some(("email", "Please enter a valid email"))
    }
}

fn require_password(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if request.password.is_empty() {
        Some(("password", "Please enter your password"))
    } else {
        None
    }
}

fn password_length(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if !request.password.is_empty() && request.password.len() < 8 {
        Some(("password", "Password must be at least 8 characters"))
    } else {
        None
    }
}

fn require_confirm_password(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    if request.confirm_password.is_empty() {
        Some(("confirm_password", "Please confirm your password"))
    } else {
        None
    }
}

fn passwords_match(request: &RegisterRequest) -> Option<(&'static str, &'static str)> {
    // Only meaningful once the password itself is acceptable.
    if request.password.len() >= 8
        && !request.confirm_password.is_empty()
        && request.confirm_password != request.password
    {
        Some(("confirm_password", "Passwords do not match"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_registration() -> RegisterRequest {
        RegisterRequest {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@x.com".to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        let errors = validate_registration(&valid_registration());
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_fields_each_get_a_message() {
        let request = RegisterRequest {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
        };
        let errors = validate_registration(&request);
        assert_eq!(
            errors.get("first_name").map(String::as_str),
            Some("Please enter your first name")
        );
        assert_eq!(
            errors.get("last_name").map(String::as_str),
            Some("Please enter your last name")
        );
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter your email")
        );
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Please enter your password")
        );
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Please confirm your password")
        );
    }

    #[test]
    fn short_password_is_rejected() {
        let mut request = valid_registration();
        request.password = "short".to_string();
        request.confirm_password = "short".to_string();
        let errors = validate_registration(&request);
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Password must be at least 8 characters")
        );
        // Mismatch is not reported while the password itself is invalid.
        assert!(!errors.contains_key("confirm_password"));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut request = valid_registration();
        request.email = "   ".to_string();
        let errors = validate_registration(&request);
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter your email")
        );
    }

    #[test]
    fn invalid_email_format_is_reported() {
        let mut request = valid_registration();
        request.email = "not-an-email".to_string();
        let errors = validate_registration(&request);
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter a valid email")
        );
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let mut request = valid_registration();
        request.confirm_password = "password124".to_string();
        let errors = validate_registration(&request);
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn login_rules_follow_the_same_shape() {
        let request = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        let errors = validate_login(&request);
        assert_eq!(errors.len(), 2);

        let request = LoginRequest {
            email: "john@x.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_login(&request).is_empty());

        let request = LoginRequest {
            email: "nope".to_string(),
            password: "password123".to_string(),
        };
        assert_eq!(
            validate_login(&request).get("email").map(String::as_str),
            Some("Please enter a valid email")
        );
    }
}
