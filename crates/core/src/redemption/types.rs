//! Redemption state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use stellar_shared::types::TransactionId;

use crate::ledger::LedgerError;

/// Redemption workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    /// Requested, not yet presented to staff.
    Pending,
    /// Debited by a cashier (terminal).
    Fulfilled,
    /// Withdrawn (terminal).
    Cancelled,
}

impl RedemptionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true for fulfilled and cancelled.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Transition `pending -> fulfilled`.
    pub fn fulfil(self, id: TransactionId) -> Result<Self, LedgerError> {
        match self {
            Self::Pending => Ok(Self::Fulfilled),
            Self::Fulfilled | Self::Cancelled => Err(LedgerError::AlreadyProcessed(id)),
        }
    }

    /// Transition `pending -> cancelled`.
    pub fn cancel(self, id: TransactionId) -> Result<Self, LedgerError> {
        match self {
            Self::Pending => Ok(Self::Cancelled),
            Self::Fulfilled | Self::Cancelled => Err(LedgerError::AlreadyProcessed(id)),
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
