//! User roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User role in the loyalty program.
///
/// Roles are ordered from lowest to highest privilege and compared
/// numerically. Higher roles can perform all actions of lower roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Accrues, transfers and redeems their own points.
    Regular = 0,
    /// Records purchases and fulfils redemptions.
    Cashier = 1,
    /// Adjusts balances, awards events, flags suspicious transactions.
    Manager = 2,
    /// Full access.
    Superuser = 3,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Some(Self::Regular),
            "cashier" => Some(Self::Cashier),
            "manager" => Some(Self::Manager),
            "superuser" => Some(Self::Superuser),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Cashier => "cashier",
            Self::Manager => "manager",
            Self::Superuser => "superuser",
        }
    }

    /// Returns true if this role meets the given floor.
    #[must_use]
    pub fn at_least(self, floor: Self) -> bool {
        self >= floor
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
