//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 4;
pub const PASSWORD_MAX_CHARS: usize = 128;
pub const DEVICE_ID_MAX_CHARS: usize = 128;

/// Treat absent and empty fields alike, the way the game client sends them
pub fn required(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// Validate an already trimmed username
pub fn validate_username(username: &str) -> Result<(), String> {
    let length = username.chars().count();

    if length < USERNAME_MIN_CHARS {
        return Err(format!(
            "Username must be at least {} characters long.",
            USERNAME_MIN_CHARS
        ));
    }

    if length > USERNAME_MAX_CHARS {
        return Err(format!(
            "Username must be at most {} characters long.",
            USERNAME_MAX_CHARS
        ));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    let length = password.chars().count();

    if length < PASSWORD_MIN_CHARS {
        return Err(format!(
            "Password must be at least {} characters long.",
            PASSWORD_MIN_CHARS
        ));
    }

    if length > PASSWORD_MAX_CHARS {
        return Err(format!(
            "Password must be at most {} characters long.",
            PASSWORD_MAX_CHARS
        ));
    }

    Ok(())
}

/// Lowercase and trim a gmail address the way it is stored
pub fn normalize_gmail(gmail: &str) -> String {
    gmail.trim().to_lowercase()
}

/// Validate an already normalized gmail address
pub fn validate_gmail(gmail: &str) -> Result<(), String> {
    static GMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = GMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@gmail\.com$").expect("Failed to compile gmail regex")
    });

    if !regex.is_match(gmail) {
        return Err("Email must end with @gmail.com".to_string());
    }

    Ok(())
}

pub fn validate_device_id(device_id: &str) -> Result<(), String> {
    if device_id.chars().count() > DEVICE_ID_MAX_CHARS {
        return Err(format!(
            "deviceId must be at most {} characters long.",
            DEVICE_ID_MAX_CHARS
        ));
    }

    Ok(())
}

/// Validate a win or loss counter and narrow it to its stored width
pub fn validate_score(field: &str, value: i64) -> Result<u32, String> {
    if value < 0 {
        return Err(format!("{} must be a non-negative integer.", field));
    }

    u32::try_from(value).map_err(|_| format!("{} is too large.", field))
}
