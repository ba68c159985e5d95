//! User directory errors.

use thiserror::Error;

use stellar_shared::types::UserId;

/// Errors that can occur during directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Handle is malformed.
    #[error("Invalid utorid: {0}")]
    InvalidUtorid(String),

    /// Display name is empty or too long.
    #[error("Name must be between 1 and 50 characters")]
    InvalidName,

    /// Handle is already registered.
    #[error("User {0} already exists")]
    DuplicateUtorid(String),

    /// User does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),
}

impl DirectoryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUtorid(_) => "INVALID_UTORID",
            Self::InvalidName => "INVALID_NAME",
            Self::DuplicateUtorid(_) => "DUPLICATE_UTORID",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidUtorid(_) | Self::InvalidName => 400,
            Self::DuplicateUtorid(_) => 409,
            Self::UserNotFound(_) => 404,
        }
    }
}
