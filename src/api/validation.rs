//! Input validation for API requests.
//!
//! Field validators mirror the rules the mobile/web clients already rely
//! on: required text fields, 255-character caps on title/subject/level,
//! non-negative point values. Collect failures with the
//! `ValidationErrorBuilder` from the `error` module so a 422 reports every
//! violated field at once.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Permissive email shape check; uniqueness is a separate concern
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

const SHORT_TEXT_MAX: usize = 255;

/// Required text with the standard 255-char cap (title, subject, level)
pub fn validate_short_text(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    if value.len() > SHORT_TEXT_MAX {
        return Err(format!(
            "{} is too long (max {} characters)",
            field, SHORT_TEXT_MAX
        ));
    }
    Ok(())
}

/// Required text without a length cap (description, content)
pub fn validate_long_text(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Optional URL-ish string (file_url / file_path); only bounded, not parsed
pub fn validate_optional_text(value: &Option<String>, field: &str) -> Result<(), String> {
    if let Some(v) = value {
        if v.len() > 2048 {
            return Err(format!("{} is too long (max 2048 characters)", field));
        }
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > SHORT_TEXT_MAX {
        return Err("Email is too long (max 255 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    Ok(())
}

/// Points and points_earned: required, integer, zero or greater.
/// No upper bound is enforced anywhere in the system.
pub fn validate_points(points: Option<i64>, field: &str) -> Result<i64, String> {
    match points {
        None => Err(format!("{} is required", field)),
        Some(p) if p < 0 => Err(format!("{} must be zero or greater", field)),
        Some(p) => Ok(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_rules() {
        assert!(validate_short_text("Algebra", "Title").is_ok());
        assert!(validate_short_text("", "Title").is_err());
        assert!(validate_short_text("   ", "Title").is_err());
        assert!(validate_short_text(&"x".repeat(255), "Title").is_ok());
        assert!(validate_short_text(&"x".repeat(256), "Title").is_err());
    }

    #[test]
    fn long_text_has_no_cap() {
        assert!(validate_long_text(&"x".repeat(100_000), "Content").is_ok());
        assert!(validate_long_text("", "Content").is_err());
    }

    #[test]
    fn optional_text_allows_none() {
        assert!(validate_optional_text(&None, "file_url").is_ok());
        assert!(validate_optional_text(&Some("https://cdn.example/l.pdf".into()), "file_url").is_ok());
        assert!(validate_optional_text(&Some("x".repeat(3000)), "file_url").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("teacher@school.test").is_ok());
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@signs.test").is_err());
        assert!(validate_email("spaces in@mail.test").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn points_bounds() {
        assert_eq!(validate_points(Some(0), "Points"), Ok(0));
        assert_eq!(validate_points(Some(10), "Points"), Ok(10));
        // Deliberately unbounded above
        assert!(validate_points(Some(1_000_000), "Points").is_ok());
        assert!(validate_points(Some(-1), "Points").is_err());
        assert!(validate_points(None, "Points").is_err());
    }
}
