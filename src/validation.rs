//! Input validation rules
//!
//! Everything here runs before any capability is called, so a rejected
//! input never reaches the session provider or the document store.

use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures reported back to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("At least one activity is required")]
    LastActivity,

    #[error("No activity at position {0}")]
    ActivityIndex(usize),

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown trip type: {0}")]
    UnknownTripType(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
}

/// Rejects when any of the given values is empty.
pub fn require_all(values: &[&str]) -> Result<(), ValidationError> {
    if values.iter().any(|value| value.is_empty()) {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

/// Parses an optional date; blank means "not set".
pub fn parse_optional_date(
    field: &'static str,
    value: &str,
) -> Result<Option<NaiveDate>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(field, value).map(Some)
}

/// Removal rule for the activity list: position must exist and one must remain.
pub fn check_activity_removal(len: usize, index: usize) -> Result<(), ValidationError> {
    if len <= 1 {
        return Err(ValidationError::LastActivity);
    }
    if index >= len {
        return Err(ValidationError::ActivityIndex(index));
    }
    Ok(())
}

pub fn check_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

pub fn check_password_confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
