//! Per-user balance projection.
//!
//! Each user owns one slot: a mutex around the cached balance. Holding the
//! slot's guard is what serializes check-then-act on that user's points, so
//! the ledger service keeps it locked across the whole append-and-apply
//! unit. Operations on different users never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use stellar_shared::types::UserId;

/// A user's balance slot.
pub type BalanceSlot = Arc<Mutex<i64>>;

/// Cached balances keyed by user.
#[derive(Debug, Default)]
pub struct BalanceStore {
    slots: DashMap<UserId, BalanceSlot>,
}

impl BalanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's slot, creating a zero balance on first use.
    ///
    /// The map shard is released before the caller locks the slot.
    #[must_use]
    pub fn slot(&self, user: UserId) -> BalanceSlot {
        self.slots.entry(user).or_default().value().clone()
    }

    /// Reads the cached balance.
    #[must_use]
    pub fn current(&self, user: UserId) -> i64 {
        *self.slot(user).lock()
    }

    /// Users that have a slot, in ID order.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.slots.iter().map(|entry| *entry.key()).collect();
        users.sort();
        users
    }
}
