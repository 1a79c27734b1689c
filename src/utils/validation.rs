use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::error::{AppError, AppResult, Conflict};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

fn is_printable(s: &str) -> bool {
    s.chars().all(|c| !c.is_control())
}

fn validate_name(kind: &str, name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", kind)));
    }

    if name.chars().count() > 64 {
        return Err(AppError::Validation(format!(
            "{} must be at most 64 characters long",
            kind
        )));
    }

    if !is_printable(name) {
        return Err(AppError::Validation(format!(
            "{} must not contain control characters",
            kind
        )));
    }

    Ok(())
}

/// Unwraps a field the caller was required to send.
pub fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Conflict(Conflict::FieldRequired(field.to_string())))
}

pub fn validate_username(username: &str) -> AppResult<()> {
    validate_name("Username", username)?;

    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Username must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::Validation("Email address is invalid".to_string()));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_server_name(name: &str) -> AppResult<()> {
    validate_name("Server name", name)
}

pub fn validate_channel_name(name: &str) -> AppResult<()> {
    validate_name("Channel name", name)
}

pub fn validate_message_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }

    if content.chars().count() > 4000 {
        return Err(AppError::Validation(
            "Message content must be at most 4000 characters long".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_message_title(title: &str) -> AppResult<()> {
    if title.chars().count() > 128 {
        return Err(AppError::Validation(
            "Message title must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}
