//! Ledger domain types.
//!
//! A transaction is a common envelope (id, owner, amount, actor, remark,
//! timestamp, suspicious flag) around a tagged, kind-specific detail.
//! [`TransactionRecord`] is the flat interchange form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use stellar_shared::types::{EventId, PromotionId, TransactionId, UserId};

use crate::redemption::RedemptionStatus;

/// Transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Points earned on a purchase.
    Purchase,
    /// Manual correction of a prior transaction.
    Adjustment,
    /// One leg of a user-to-user transfer.
    Transfer,
    /// Points converted to value, fulfilled by staff.
    Redemption,
    /// Points awarded for an event.
    Event,
}

impl TransactionKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Adjustment => "adjustment",
            Self::Transfer => "transfer",
            Self::Redemption => "redemption",
            Self::Event => "event",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Some(Self::Purchase),
            "adjustment" => Some(Self::Adjustment),
            "transfer" => Some(Self::Transfer),
            "redemption" => Some(Self::Redemption),
            "event" => Some(Self::Event),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific transaction fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionDetail {
    /// Purchase recorded by a cashier.
    Purchase {
        /// Money spent.
        spent: Decimal,
        /// Promotions applied, ascending.
        promotion_ids: Vec<PromotionId>,
    },
    /// Correction of an earlier transaction of the same owner.
    Adjustment {
        /// The corrected transaction.
        related_id: TransactionId,
    },
    /// One leg of a transfer.
    Transfer {
        /// The counterparty's leg.
        related_id: TransactionId,
        /// The counterparty.
        counterparty: UserId,
    },
    /// Two-phase redemption.
    Redemption {
        /// Points requested.
        redeemed: i64,
        /// Workflow state.
        status: RedemptionStatus,
        /// Handle of the cashier who fulfilled or cancelled it.
        processed_by: Option<String>,
        /// When it was fulfilled or cancelled.
        processed_at: Option<DateTime<Utc>>,
    },
    /// Event award.
    Event {
        /// The event, when known.
        event_id: Option<EventId>,
    },
}

impl TransactionDetail {
    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase { .. } => TransactionKind::Purchase,
            Self::Adjustment { .. } => TransactionKind::Adjustment,
            Self::Transfer { .. } => TransactionKind::Transfer,
            Self::Redemption { .. } => TransactionKind::Redemption,
            Self::Event { .. } => TransactionKind::Event,
        }
    }
}

/// A committed ledger row.
///
/// Immutable once committed except for `suspicious` and the redemption
/// fulfilment stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Monotonic ID assigned at commit.
    pub id: TransactionId,
    /// Owning user.
    pub owner: UserId,
    /// Owner's handle.
    pub utorid: String,
    /// Signed effect on the owner's balance.
    pub amount: i64,
    /// Provisional hold pending investigation.
    pub suspicious: bool,
    /// Handle of the actor that created the row.
    pub created_by: String,
    /// Free-text remark.
    pub remark: String,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
    /// Kind-specific fields.
    pub detail: TransactionDetail,
}

impl Transaction {
    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.detail.kind()
    }

    /// The amount that currently counts toward the owner's balance.
    ///
    /// A suspicious row contributes nothing until cleared.
    #[must_use]
    pub const fn effective_amount(&self) -> i64 {
        if self.suspicious { 0 } else { self.amount }
    }

    /// Cross-reference: corrected row, counterparty leg, or event.
    #[must_use]
    pub fn related_id(&self) -> Option<i64> {
        match &self.detail {
            TransactionDetail::Adjustment { related_id }
            | TransactionDetail::Transfer { related_id, .. } => Some(related_id.into_inner()),
            TransactionDetail::Event { event_id } => event_id.map(EventId::into_inner),
            TransactionDetail::Purchase { .. } | TransactionDetail::Redemption { .. } => None,
        }
    }

    /// Promotions applied to a purchase; empty for other kinds.
    #[must_use]
    pub fn promotion_ids(&self) -> &[PromotionId] {
        match &self.detail {
            TransactionDetail::Purchase { promotion_ids, .. } => promotion_ids.as_slice(),
            _ => &[],
        }
    }

    /// Workflow state of a redemption.
    #[must_use]
    pub fn redemption_status(&self) -> Option<RedemptionStatus> {
        match &self.detail {
            TransactionDetail::Redemption { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Flat interchange form of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owner's handle.
    pub utorid: String,
    /// Kind.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed effect on the owner's balance.
    pub amount: i64,
    /// Money spent (purchase only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spent: Option<Decimal>,
    /// Points requested (redemption only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub redeemed: Option<i64>,
    /// Cross-reference.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub related_id: Option<i64>,
    /// Suspicious hold.
    pub suspicious: bool,
    /// Creator's handle.
    pub created_by: String,
    /// Fulfilling cashier's handle (redemption only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub processed_by: Option<String>,
    /// Applied promotions.
    pub promotion_ids: Vec<PromotionId>,
    /// Free-text remark.
    pub remark: String,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
    /// Redemption state (redemption only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<RedemptionStatus>,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        let (spent, redeemed, processed_by) = match &tx.detail {
            TransactionDetail::Purchase { spent, .. } => (Some(*spent), None, None),
            TransactionDetail::Redemption {
                redeemed,
                processed_by,
                ..
            } => (None, Some(*redeemed), processed_by.clone()),
            _ => (None, None, None),
        };

        Self {
            id: tx.id,
            utorid: tx.utorid.clone(),
            kind: tx.kind(),
            amount: tx.amount,
            spent,
            redeemed,
            related_id: tx.related_id(),
            suspicious: tx.suspicious,
            created_by: tx.created_by.clone(),
            processed_by,
            promotion_ids: tx.promotion_ids().to_vec(),
            remark: tx.remark.clone(),
            created_at: tx.created_at,
            status: tx.redemption_status(),
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        Self::from(&tx)
    }
}

/// Input for recording a purchase.
#[derive(Debug, Clone)]
pub struct PurchaseInput {
    /// Customer handle.
    pub utorid: String,
    /// Money spent; must be positive.
    pub spent: Decimal,
    /// One-time promotions requested.
    pub promotion_ids: Vec<PromotionId>,
    /// Free-text remark.
    pub remark: String,
}

/// Input for recording an adjustment.
#[derive(Debug, Clone)]
pub struct AdjustmentInput {
    /// Owner handle.
    pub utorid: String,
    /// Signed, non-zero correction.
    pub amount: i64,
    /// The corrected transaction.
    pub related_id: TransactionId,
    /// Free-text remark.
    pub remark: String,
}

/// Input for a transfer from the acting user.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Recipient.
    pub recipient: UserId,
    /// Positive points to move.
    pub amount: i64,
    /// Free-text remark.
    pub remark: String,
}

/// Input for an event award.
#[derive(Debug, Clone)]
pub struct EventAwardInput {
    /// Recipient handle.
    pub utorid: String,
    /// Positive points to award.
    pub amount: i64,
    /// The event, when known.
    pub event_id: Option<EventId>,
    /// Free-text remark.
    pub remark: String,
}

/// Input for a redemption request by the acting user.
#[derive(Debug, Clone)]
pub struct RedemptionInput {
    /// Positive points to redeem.
    pub amount: i64,
    /// Free-text remark.
    pub remark: String,
}

/// Any transaction creation request, dispatched by kind.
#[derive(Debug, Clone)]
pub enum TransactionRequest {
    /// Purchase.
    Purchase(PurchaseInput),
    /// Adjustment.
    Adjustment(AdjustmentInput),
    /// Transfer.
    Transfer(TransferInput),
    /// Event award.
    Event(EventAwardInput),
    /// Redemption request.
    Redemption(RedemptionInput),
}

impl TransactionRequest {
    /// Returns the kind the request will create.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase(_) => TransactionKind::Purchase,
            Self::Adjustment(_) => TransactionKind::Adjustment,
            Self::Transfer(_) => TransactionKind::Transfer,
            Self::Event(_) => TransactionKind::Event,
            Self::Redemption(_) => TransactionKind::Redemption,
        }
    }
}
