//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Trim and lowercase an email so it can key the pool and the rate limiter
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required.".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long.".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Please enter a valid email address.".to_string());
    }

    Ok(())
}

/// Validate password length; character classes are enforced by the pool policy
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters long.".to_string());
    }

    Ok(())
}

/// Validate a sign-up form, in the order the form reports problems
pub fn validate_sign_up(
    email: &str,
    password: &str,
    confirm_password: &str,
    agreed_to_terms: bool,
) -> Result<(), String> {
    if password != confirm_password {
        return Err("Passwords do not match.".to_string());
    }

    if !agreed_to_terms {
        return Err("You must agree to the Terms of Service.".to_string());
    }

    validate_password(password)?;
    validate_email(email)
}

/// Validate a confirmation code: six digits
pub fn validate_confirmation_code(code: &str) -> Result<(), String> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("Please enter the 6-digit code from your email.".to_string());
    }

    Ok(())
}
