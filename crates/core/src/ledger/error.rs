//! Ledger error types.
//!
//! Every failure is surfaced as a distinct, named condition. Promotion
//! eligibility mismatches are not errors and never appear here.

use thiserror::Error;

use stellar_shared::types::TransactionId;

use crate::access::{AccessDenied, Operation};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Authorization Errors ==========
    /// Role or ownership violation.
    #[error("Not permitted to {0}")]
    Forbidden(Operation),

    /// Account must be verified for this operation.
    #[error("User {0} is not verified")]
    Unverified(String),

    // ========== Validation Errors ==========
    /// Zero, non-integer or wrong-signed amount for the kind.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Sender and recipient are the same user.
    #[error("Cannot transfer points to yourself")]
    SelfTransfer,

    /// Operation requires a redemption transaction.
    #[error("Transaction {0} is not a redemption")]
    NotARedemption(TransactionId),

    // ========== Balance Errors ==========
    /// Balance does not cover the requested points.
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Points currently available.
        available: i64,
        /// Points requested.
        requested: i64,
    },

    // ========== Reference Errors ==========
    /// Target handle or id does not resolve.
    #[error("User not found: {0}")]
    UnknownUser(String),

    /// Related transaction is missing or owned by someone else.
    #[error("Related transaction not found: {0}")]
    UnknownRelated(TransactionId),

    /// Transaction does not exist.
    #[error("Transaction not found: {0}")]
    UnknownTransaction(TransactionId),

    // ========== State Errors ==========
    /// Redemption already fulfilled or cancelled.
    #[error("Redemption {0} has already been processed")]
    AlreadyProcessed(TransactionId),

    /// Row is under a suspicious hold and cannot be settled.
    #[error("Transaction {0} is on hold")]
    Held(TransactionId),
}

impl From<AccessDenied> for LedgerError {
    fn from(denied: AccessDenied) -> Self {
        Self::Forbidden(denied.operation)
    }
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unverified(_) => "UNVERIFIED",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::NotARedemption(_) => "NOT_A_REDEMPTION",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::UnknownUser(_) => "UNKNOWN_USER",
            Self::UnknownRelated(_) => "UNKNOWN_RELATED",
            Self::UnknownTransaction(_) => "UNKNOWN_TRANSACTION",
            Self::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            Self::Held(_) => "TRANSACTION_HELD",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_)
            | Self::SelfTransfer
            | Self::NotARedemption(_)
            | Self::InsufficientBalance { .. } => 400,

            // 403 Forbidden - permission errors
            Self::Forbidden(_) | Self::Unverified(_) => 403,

            // 404 Not Found
            Self::UnknownUser(_) | Self::UnknownRelated(_) | Self::UnknownTransaction(_) => 404,

            // 409 Conflict - state errors
            Self::AlreadyProcessed(_) | Self::Held(_) => 409,
        }
    }

    /// Returns true if the caller may retry later without changing input.
    ///
    /// A shortfall can clear after an incoming transfer or adjustment.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. })
    }
}
