//! Custom error types for the account service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{password::PasswordError, store::StoreError};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error. Please try again later.";

/// Custom error type for the account service
#[derive(Error, Debug)]
pub enum AccountError {
    /// Missing or malformed field
    #[error("{0}")]
    Validation(String),

    /// Unique field already taken
    #[error("{0} already exists.")]
    Conflict(&'static str),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Invalid or expired recovery token.")]
    InvalidRecoveryToken,

    /// Every device slot is taken by other devices
    #[error("Maximum {0} devices allowed. Reset password to log in on this device.")]
    DeviceLimit(usize),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many attempts. Please try again later.")]
    TooManyAttempts,

    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => AccountError::Conflict(field),
            other => AccountError::Store(other),
        }
    }
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) | AccountError::Conflict(_) => StatusCode::BAD_REQUEST,
            AccountError::InvalidCredentials | AccountError::InvalidRecoveryToken => {
                StatusCode::UNAUTHORIZED
            }
            AccountError::DeviceLimit(_) => StatusCode::FORBIDDEN,
            AccountError::NotFound(_) => StatusCode::NOT_FOUND,
            AccountError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AccountError::Store(_) | AccountError::Password(_) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AccountError::DeviceLimit(_) => json!({
                "error": self.to_string(),
                "requirePasswordReset": true,
            }),
            AccountError::Store(_) | AccountError::Password(_) | AccountError::Internal(_) => {
                error!("Server error: {}", self);
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for account service results
pub type AccountResult<T> = Result<T, AccountError>;
