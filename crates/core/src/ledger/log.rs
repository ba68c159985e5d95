//! Append-only transaction log.
//!
//! The log is the source of truth for balances. IDs are assigned under the
//! write lock, so they are dense, monotonic and match commit order.

use std::collections::HashSet;

use parking_lot::RwLock;

use stellar_shared::types::{PromotionId, TransactionId, UserId};

use super::types::Transaction;

/// In-process transaction log.
#[derive(Debug, Default)]
pub struct TransactionLog {
    rows: RwLock<Vec<Transaction>>,
}

impl TransactionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index(id: TransactionId) -> Option<usize> {
        usize::try_from(id.into_inner()).ok()?.checked_sub(1)
    }

    fn next_id(rows: &[Transaction]) -> TransactionId {
        TransactionId::new(i64::try_from(rows.len()).unwrap_or(i64::MAX).saturating_add(1))
    }

    /// Appends one row built from its assigned ID.
    pub fn append(&self, build: impl FnOnce(TransactionId) -> Transaction) -> Transaction {
        let mut rows = self.rows.write();
        let tx = build(Self::next_id(&rows));
        rows.push(tx.clone());
        tx
    }

    /// Appends two rows under one write lock, built from their assigned IDs.
    ///
    /// Readers see both rows or neither.
    pub fn append_pair(
        &self,
        build: impl FnOnce(TransactionId, TransactionId) -> (Transaction, Transaction),
    ) -> (Transaction, Transaction) {
        let mut rows = self.rows.write();
        let first_id = Self::next_id(&rows);
        let second_id = TransactionId::new(first_id.into_inner().saturating_add(1));
        let (first, second) = build(first_id, second_id);
        rows.push(first.clone());
        rows.push(second.clone());
        (first, second)
    }

    /// Looks up a row.
    #[must_use]
    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        let index = Self::index(id)?;
        self.rows.read().get(index).cloned()
    }

    /// Owner of a row, if it exists.
    #[must_use]
    pub fn owner_of(&self, id: TransactionId) -> Option<UserId> {
        let index = Self::index(id)?;
        self.rows.read().get(index).map(|tx| tx.owner)
    }

    /// Edits a row in place and returns the closure's result.
    ///
    /// Returns `None` when the row does not exist.
    pub fn update<R>(&self, id: TransactionId, f: impl FnOnce(&mut Transaction) -> R) -> Option<R> {
        let index = Self::index(id)?;
        self.rows.write().get_mut(index).map(f)
    }

    /// Sum of effective amounts for one owner.
    #[must_use]
    pub fn sum_effective(&self, owner: UserId) -> i64 {
        self.rows
            .read()
            .iter()
            .filter(|tx| tx.owner == owner)
            .fold(0_i64, |acc, tx| acc.saturating_add(tx.effective_amount()))
    }

    /// Promotions already applied to the owner's purchases.
    #[must_use]
    pub fn consumed_promotions(&self, owner: UserId) -> HashSet<PromotionId> {
        self.rows
            .read()
            .iter()
            .filter(|tx| tx.owner == owner)
            .flat_map(|tx| tx.promotion_ids().iter().copied())
            .collect()
    }

    /// Rows matching a predicate, in ID order.
    #[must_use]
    pub fn select(&self, predicate: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.rows
            .read()
            .iter()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect()
    }

    /// Number of committed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if nothing has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}
