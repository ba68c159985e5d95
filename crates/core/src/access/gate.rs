//! Authorization gate evaluated before any ledger mutation.
//!
//! Every operation declares a role floor. Ownership-scoped operations
//! additionally require the actor to own the target resource unless the
//! actor's role meets the operation's staff override.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use stellar_shared::types::UserId;

use super::role::Role;

/// The authenticated caller of a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    /// The caller's user ID.
    pub id: UserId,
    /// The caller's handle, stamped into `createdBy`/`processedBy`.
    pub utorid: String,
    /// The caller's current role.
    pub role: Role,
    /// Whether the caller's account is verified.
    pub verified: bool,
    /// Whether the caller is under investigation.
    pub suspicious: bool,
}

/// Ledger operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Record a purchase for a customer.
    CreatePurchase,
    /// Record a manual correction.
    CreateAdjustment,
    /// Send points to another user.
    CreateTransfer,
    /// Award points for an event.
    CreateEventAward,
    /// Ask to redeem one's own points.
    RequestRedemption,
    /// Fulfil a pending redemption.
    ProcessRedemption,
    /// Withdraw a pending redemption.
    CancelRedemption,
    /// Set or clear the suspicious hold.
    MarkSuspicious,
    /// Read a single transaction.
    ViewTransaction,
    /// List one's own transactions.
    ListOwnTransactions,
    /// List every user's transactions.
    ListAllTransactions,
    /// Create promotions.
    ManagePromotions,
    /// Register a new account.
    RegisterUser,
    /// Change another user's role or flags.
    UpdateUser,
}

impl Operation {
    /// Returns the string representation of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreatePurchase => "create_purchase",
            Self::CreateAdjustment => "create_adjustment",
            Self::CreateTransfer => "create_transfer",
            Self::CreateEventAward => "create_event_award",
            Self::RequestRedemption => "request_redemption",
            Self::ProcessRedemption => "process_redemption",
            Self::CancelRedemption => "cancel_redemption",
            Self::MarkSuspicious => "mark_suspicious",
            Self::ViewTransaction => "view_transaction",
            Self::ListOwnTransactions => "list_own_transactions",
            Self::ListAllTransactions => "list_all_transactions",
            Self::ManagePromotions => "manage_promotions",
            Self::RegisterUser => "register_user",
            Self::UpdateUser => "update_user",
        }
    }

    /// Returns the authorization policy for this operation.
    #[must_use]
    pub const fn policy(self) -> Policy {
        use Ownership::{Any, SelfOnly};

        let (floor, ownership) = match self {
            Self::CreatePurchase | Self::ProcessRedemption | Self::RegisterUser => {
                (Role::Cashier, Any)
            }
            Self::CreateAdjustment
            | Self::CreateEventAward
            | Self::MarkSuspicious
            | Self::ListAllTransactions
            | Self::ManagePromotions
            | Self::UpdateUser => (Role::Manager, Any),
            Self::CreateTransfer | Self::RequestRedemption | Self::ListOwnTransactions => (
                Role::Regular,
                SelfOnly {
                    staff_override: None,
                },
            ),
            Self::CancelRedemption => (
                Role::Regular,
                SelfOnly {
                    staff_override: Some(Role::Cashier),
                },
            ),
            Self::ViewTransaction => (
                Role::Regular,
                SelfOnly {
                    staff_override: Some(Role::Manager),
                },
            ),
        };

        Policy { floor, ownership }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership requirement of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Any target is acceptable once the role floor is met.
    Any,
    /// The actor must own the target, unless their role meets the override.
    SelfOnly {
        /// Role that may act on other users' resources.
        staff_override: Option<Role>,
    },
}

/// Role floor plus ownership requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Minimum role for the operation.
    pub floor: Role,
    /// Ownership requirement.
    pub ownership: Ownership,
}

/// Authorization failure.
///
/// Carries only the operation so the message never depends on whether
/// the target resource exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Not permitted to {operation}")]
pub struct AccessDenied {
    /// The operation that was refused.
    pub operation: Operation,
}

/// Stateless authorization gate.
pub struct AccessGate;

impl AccessGate {
    /// Decide whether an actor may perform an operation on a target owner.
    ///
    /// `target_owner` is `None` when the target does not resolve; ownership
    /// scoped operations then succeed only through the staff override.
    #[must_use]
    pub fn allowed(
        actor_role: Role,
        actor_id: UserId,
        operation: Operation,
        target_owner: Option<UserId>,
    ) -> bool {
        let policy = operation.policy();
        if !actor_role.at_least(policy.floor) {
            return false;
        }

        match policy.ownership {
            Ownership::Any => true,
            Ownership::SelfOnly { staff_override } => {
                staff_override.is_some_and(|role| actor_role.at_least(role))
                    || target_owner == Some(actor_id)
            }
        }
    }

    /// Like [`AccessGate::allowed`], as a `Result` for use with `?`.
    pub fn authorize(
        actor: &Actor,
        operation: Operation,
        target_owner: Option<UserId>,
    ) -> Result<(), AccessDenied> {
        if Self::allowed(actor.role, actor.id, operation, target_owner) {
            Ok(())
        } else {
            tracing::warn!(
                actor = %actor.utorid,
                role = %actor.role,
                operation = %operation,
                "Access denied"
            );
            Err(AccessDenied { operation })
        }
    }

    /// Returns true if the actor's role overrides ownership for the operation.
    #[must_use]
    pub fn has_staff_override(actor_role: Role, operation: Operation) -> bool {
        match operation.policy().ownership {
            Ownership::Any => actor_role.at_least(operation.policy().floor),
            Ownership::SelfOnly { staff_override } => {
                staff_override.is_some_and(|role| actor_role.at_least(role))
            }
        }
    }
}
