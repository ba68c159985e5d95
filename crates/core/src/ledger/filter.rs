//! Transaction listing and filtering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stellar_shared::types::{PageRequest, PageResponse, PromotionId, UserId};

use super::error::LedgerError;
use super::service::PointsLedger;
use super::types::{Transaction, TransactionKind};
use crate::access::{AccessGate, Actor, Operation};

/// Comparison applied to the `amount` filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountOperator {
    /// `amount >= value`
    #[default]
    Gte,
    /// `amount <= value`
    Lte,
}

impl AmountOperator {
    /// Parses an operator from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    const fn matches(self, amount: i64, bound: i64) -> bool {
        match self {
            Self::Gte => amount >= bound,
            Self::Lte => amount <= bound,
        }
    }
}

/// Whose transactions a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Only the actor's own rows.
    Own,
    /// Every user's rows (manager or above).
    All,
}

/// Filter for transaction listings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Owner handle or display name contains this (case-insensitive).
    pub name: Option<String>,
    /// Creator handle (case-insensitive).
    pub created_by: Option<String>,
    /// Suspicious flag.
    pub suspicious: Option<bool>,
    /// Kind.
    pub kind: Option<TransactionKind>,
    /// Cross-reference.
    pub related_id: Option<i64>,
    /// Applied promotion.
    pub promotion_id: Option<PromotionId>,
    /// Amount bound, compared with `operator`.
    pub amount: Option<i64>,
    /// Comparison for `amount`.
    pub operator: AmountOperator,
}

impl TransactionFilter {
    /// Creates a filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts by amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: i64, operator: AmountOperator) -> Self {
        self.amount = Some(amount);
        self.operator = operator;
        self
    }

    /// Returns true if the filter matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Tests a row against every field except `name`.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|kind| tx.kind() == kind)
            && self.suspicious.is_none_or(|flag| tx.suspicious == flag)
            && self
                .created_by
                .as_deref()
                .is_none_or(|creator| tx.created_by.eq_ignore_ascii_case(creator.trim()))
            && self.related_id.is_none_or(|id| tx.related_id() == Some(id))
            && self
                .promotion_id
                .is_none_or(|id| tx.promotion_ids().contains(&id))
            && self
                .amount
                .is_none_or(|bound| self.operator.matches(tx.amount, bound))
    }
}

impl PointsLedger {
    /// Lists transactions visible to the actor, in ID order.
    ///
    /// # Arguments
    /// * `actor` - The caller
    /// * `scope` - `Own` for the caller's rows, `All` for everyone's
    /// * `filter` - Field filters
    /// * `page` - Page window; `count` reflects all matches
    pub fn list(
        &self,
        actor: &Actor,
        scope: ListScope,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Transaction>, LedgerError> {
        let owner = match scope {
            ListScope::Own => {
                AccessGate::authorize(actor, Operation::ListOwnTransactions, Some(actor.id))?;
                Some(actor.id)
            }
            ListScope::All => {
                AccessGate::authorize(actor, Operation::ListAllTransactions, None)?;
                None
            }
        };

        let named: Option<HashSet<UserId>> = filter.name.as_deref().map(|needle| {
            let needle = needle.trim().to_lowercase();
            self.directory()
                .all()
                .into_iter()
                .filter(|user| {
                    user.utorid.contains(&needle) || user.name.to_lowercase().contains(&needle)
                })
                .map(|user| user.id)
                .collect()
        });

        let rows = self.log.select(|tx| {
            owner.is_none_or(|id| tx.owner == id)
                && named.as_ref().is_none_or(|ids| ids.contains(&tx.owner))
                && filter.matches(tx)
        });

        tracing::debug!(
            actor = %actor.utorid,
            scope = ?scope,
            matched = rows.len(),
            "Transactions listed"
        );
        Ok(PageResponse::paginate(rows, page))
    }
}
