//! Promotion catalog errors.

use thiserror::Error;

use stellar_shared::types::PromotionId;

/// Errors that can occur when defining promotions.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// Name is empty.
    #[error("Promotion name is required")]
    NameRequired,

    /// End time is not after start time.
    #[error("Promotion must end after it starts")]
    InvalidWindow,

    /// Neither a rate bonus nor a fixed award was given.
    #[error("Promotion must grant a rate bonus or fixed points")]
    NoReward,

    /// A numeric field is negative.
    #[error("Promotion field {0} must not be negative")]
    NegativeValue(&'static str),

    /// Promotion does not exist.
    #[error("Promotion not found: {0}")]
    NotFound(PromotionId),
}

impl PromotionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NameRequired => "NAME_REQUIRED",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::NoReward => "NO_REWARD",
            Self::NegativeValue(_) => "NEGATIVE_VALUE",
            Self::NotFound(_) => "PROMOTION_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            _ => 400,
        }
    }
}
