//! Ledger service.
//!
//! Every mutation follows the same unit of work: authorize, validate, lock
//! the owner's balance slot, re-check balance-dependent rules, append or
//! edit the log row, apply the change in effective amount to the slot,
//! release. Transfers lock both users' slots in ID order.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stellar_shared::types::{PromotionId, TransactionId, UserId};

use super::balance::BalanceStore;
use super::error::LedgerError;
use super::log::TransactionLog;
use super::types::{
    AdjustmentInput, EventAwardInput, PurchaseInput, Transaction, TransactionDetail,
    TransactionRequest, TransferInput,
};
use crate::access::{AccessGate, Actor, Operation};
use crate::promotion::{Promotion, PromotionCatalog, PromotionResolver, floor_points};
use crate::user::{User, UserDirectory};

/// Default points earned per currency unit spent.
pub const DEFAULT_BASE_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// Ledger tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Points per currency unit spent, floored per purchase.
    pub base_rate: Decimal,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_rate: DEFAULT_BASE_RATE,
        }
    }
}

/// The points ledger engine.
#[derive(Debug)]
pub struct PointsLedger {
    settings: LedgerSettings,
    directory: Arc<UserDirectory>,
    catalog: Arc<PromotionCatalog>,
    pub(crate) balances: BalanceStore,
    pub(crate) log: TransactionLog,
}

impl PointsLedger {
    /// Creates an empty ledger over a user directory and promotion catalog.
    #[must_use]
    pub fn new(
        settings: LedgerSettings,
        directory: Arc<UserDirectory>,
        catalog: Arc<PromotionCatalog>,
    ) -> Self {
        Self {
            settings,
            directory,
            catalog,
            balances: BalanceStore::new(),
            log: TransactionLog::new(),
        }
    }

    /// The ledger's settings.
    #[must_use]
    pub const fn settings(&self) -> LedgerSettings {
        self.settings
    }

    /// The user directory.
    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// The promotion catalog.
    #[must_use]
    pub fn catalog(&self) -> &PromotionCatalog {
        &self.catalog
    }

    /// Resolves a user ID to an actor with their current role and flags.
    pub fn actor(&self, id: UserId) -> Result<Actor, LedgerError> {
        self.directory
            .find(id)
            .map(|user| user.as_actor())
            .ok_or_else(|| LedgerError::UnknownUser(id.to_string()))
    }

    pub(crate) fn user_by_utorid(&self, utorid: &str) -> Result<User, LedgerError> {
        self.directory
            .find_by_utorid(utorid)
            .ok_or_else(|| LedgerError::UnknownUser(utorid.to_string()))
    }

    /// Records a transaction of any kind.
    ///
    /// # Arguments
    /// * `actor` - The authenticated caller
    /// * `request` - Kind-specific payload
    ///
    /// # Returns
    /// The committed row. A transfer returns the sender's leg.
    pub fn record(
        &self,
        actor: &Actor,
        request: TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        match request {
            TransactionRequest::Purchase(input) => self.purchase(actor, input),
            TransactionRequest::Adjustment(input) => self.adjust(actor, input),
            TransactionRequest::Transfer(input) => self.transfer(actor, input).map(|(sent, _)| sent),
            TransactionRequest::Event(input) => self.award_event(actor, input),
            TransactionRequest::Redemption(input) => self.request_redemption(actor, input),
        }
    }

    /// Records a purchase for a customer.
    ///
    /// Earns `floor(spent * base_rate)` plus promotion bonuses. Purchases
    /// entered by a suspicious cashier are committed on hold.
    pub fn purchase(&self, actor: &Actor, input: PurchaseInput) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::CreatePurchase, None)?;
        if input.spent <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "spent must be positive, got {}",
                input.spent
            )));
        }
        let base = floor_points(input.spent, self.settings.base_rate)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("spent {} is too large", input.spent)))?;
        let customer = self.user_by_utorid(&input.utorid)?;
        let now = Utc::now();
        let candidates = self.catalog.active_at(now);

        let slot = self.balances.slot(customer.id);
        let mut balance = slot.lock();

        let consumed = self.log.consumed_promotions(customer.id);
        let resolution =
            PromotionResolver::resolve(input.spent, now, &input.promotion_ids, &candidates, &consumed);
        let amount = base
            .checked_add(resolution.bonus)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("spent {} is too large", input.spent)))?;

        let tx = self.log.append(|id| Transaction {
            id,
            owner: customer.id,
            utorid: customer.utorid.clone(),
            amount,
            suspicious: actor.suspicious,
            created_by: actor.utorid.clone(),
            remark: input.remark,
            created_at: now,
            detail: TransactionDetail::Purchase {
                spent: input.spent,
                promotion_ids: resolution.applied,
            },
        });
        *balance += tx.effective_amount();

        tracing::info!(
            transaction_id = %tx.id,
            kind = %tx.kind(),
            owner = %tx.utorid,
            amount = tx.amount,
            base,
            bonus = resolution.bonus,
            held = tx.suspicious,
            "Purchase recorded"
        );
        Ok(tx)
    }

    /// Records a manual correction against an earlier transaction of the
    /// same owner. The balance may go negative.
    pub fn adjust(&self, actor: &Actor, input: AdjustmentInput) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::CreateAdjustment, None)?;
        if input.amount == 0 {
            return Err(LedgerError::InvalidAmount(
                "adjustment amount must be non-zero".to_string(),
            ));
        }
        let owner = self.user_by_utorid(&input.utorid)?;
        if self.log.owner_of(input.related_id) != Some(owner.id) {
            return Err(LedgerError::UnknownRelated(input.related_id));
        }

        let slot = self.balances.slot(owner.id);
        let mut balance = slot.lock();
        let new_balance = balance
            .checked_add(input.amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} overflows the balance", input.amount)))?;

        let tx = self.log.append(|id| Transaction {
            id,
            owner: owner.id,
            utorid: owner.utorid.clone(),
            amount: input.amount,
            suspicious: false,
            created_by: actor.utorid.clone(),
            remark: input.remark,
            created_at: Utc::now(),
            detail: TransactionDetail::Adjustment {
                related_id: input.related_id,
            },
        });
        *balance = new_balance;

        tracing::info!(
            transaction_id = %tx.id,
            kind = %tx.kind(),
            owner = %tx.utorid,
            amount = tx.amount,
            related_id = %input.related_id,
            "Adjustment recorded"
        );
        Ok(tx)
    }

    /// Moves points from the acting user to a recipient.
    ///
    /// # Returns
    /// `(sender_leg, recipient_leg)`, cross-referenced through `relatedId`.
    pub fn transfer(
        &self,
        actor: &Actor,
        input: TransferInput,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        AccessGate::authorize(actor, Operation::CreateTransfer, Some(actor.id))?;
        if !actor.verified {
            return Err(LedgerError::Unverified(actor.utorid.clone()));
        }
        if input.amount <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                input.amount
            )));
        }
        if input.recipient == actor.id {
            return Err(LedgerError::SelfTransfer);
        }
        let recipient = self
            .directory
            .find(input.recipient)
            .ok_or_else(|| LedgerError::UnknownUser(input.recipient.to_string()))?;

        let sender_slot = self.balances.slot(actor.id);
        let recipient_slot = self.balances.slot(recipient.id);
        let (mut sender_balance, mut recipient_balance) = if actor.id < recipient.id {
            let s = sender_slot.lock();
            let r = recipient_slot.lock();
            (s, r)
        } else {
            let r = recipient_slot.lock();
            let s = sender_slot.lock();
            (s, r)
        };

        if *sender_balance < input.amount {
            tracing::warn!(
                sender = %actor.utorid,
                available = *sender_balance,
                requested = input.amount,
                "Transfer rejected: insufficient balance"
            );
            return Err(LedgerError::InsufficientBalance {
                available: *sender_balance,
                requested: input.amount,
            });
        }
        let credited = recipient_balance
            .checked_add(input.amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} overflows the balance", input.amount)))?;

        let now = Utc::now();
        let (sent, received) = self.log.append_pair(|sent_id, received_id| {
            (
                Transaction {
                    id: sent_id,
                    owner: actor.id,
                    utorid: actor.utorid.clone(),
                    amount: -input.amount,
                    suspicious: false,
                    created_by: actor.utorid.clone(),
                    remark: input.remark.clone(),
                    created_at: now,
                    detail: TransactionDetail::Transfer {
                        related_id: received_id,
                        counterparty: recipient.id,
                    },
                },
                Transaction {
                    id: received_id,
                    owner: recipient.id,
                    utorid: recipient.utorid.clone(),
                    amount: input.amount,
                    suspicious: false,
                    created_by: actor.utorid.clone(),
                    remark: input.remark,
                    created_at: now,
                    detail: TransactionDetail::Transfer {
                        related_id: sent_id,
                        counterparty: actor.id,
                    },
                },
            )
        });
        *sender_balance -= input.amount;
        *recipient_balance = credited;

        tracing::info!(
            sender_transaction = %sent.id,
            recipient_transaction = %received.id,
            sender = %sent.utorid,
            recipient = %received.utorid,
            amount = input.amount,
            "Transfer recorded"
        );
        Ok((sent, received))
    }

    /// Awards event points to one user.
    pub fn award_event(
        &self,
        actor: &Actor,
        input: EventAwardInput,
    ) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::CreateEventAward, None)?;
        if input.amount <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "event award must be positive, got {}",
                input.amount
            )));
        }
        let recipient = self.user_by_utorid(&input.utorid)?;

        let slot = self.balances.slot(recipient.id);
        let mut balance = slot.lock();
        let new_balance = balance
            .checked_add(input.amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} overflows the balance", input.amount)))?;

        let tx = self.log.append(|id| Transaction {
            id,
            owner: recipient.id,
            utorid: recipient.utorid.clone(),
            amount: input.amount,
            suspicious: false,
            created_by: actor.utorid.clone(),
            remark: input.remark,
            created_at: Utc::now(),
            detail: TransactionDetail::Event {
                event_id: input.event_id,
            },
        });
        *balance = new_balance;

        tracing::info!(
            transaction_id = %tx.id,
            kind = %tx.kind(),
            owner = %tx.utorid,
            amount = tx.amount,
            "Event points awarded"
        );
        Ok(tx)
    }

    /// Sets or clears the suspicious hold on a transaction.
    ///
    /// Setting the flag to its current value changes nothing. The owner's
    /// balance moves by the change in effective amount, computed from the
    /// stored `amount`.
    pub fn set_suspicious(
        &self,
        actor: &Actor,
        id: TransactionId,
        suspicious: bool,
    ) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::MarkSuspicious, None)?;
        let owner = self
            .log
            .owner_of(id)
            .ok_or(LedgerError::UnknownTransaction(id))?;

        let slot = self.balances.slot(owner);
        let mut balance = slot.lock();
        let (tx, delta) = self
            .log
            .update(id, |tx| {
                let before = tx.effective_amount();
                tx.suspicious = suspicious;
                (tx.clone(), tx.effective_amount() - before)
            })
            .ok_or(LedgerError::UnknownTransaction(id))?;
        *balance += delta;

        tracing::info!(
            transaction_id = %id,
            owner = %tx.utorid,
            suspicious,
            delta,
            actor = %actor.utorid,
            "Suspicious flag updated"
        );
        Ok(tx)
    }

    /// Reads one transaction.
    ///
    /// Owners may read their own rows, managers any row. A caller without
    /// the override asking for a missing row is refused, not told it is
    /// missing.
    pub fn transaction(&self, actor: &Actor, id: TransactionId) -> Result<Transaction, LedgerError> {
        let found = self.log.get(id);
        AccessGate::authorize(actor, Operation::ViewTransaction, found.as_ref().map(|tx| tx.owner))?;
        found.ok_or(LedgerError::UnknownTransaction(id))
    }

    /// Number of committed rows.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.log.len()
    }

    /// The cached balance of a user.
    #[must_use]
    pub fn balance(&self, user: UserId) -> i64 {
        self.balances.current(user)
    }

    /// The balance of a user recomputed from the log.
    #[must_use]
    pub fn ledger_balance(&self, user: UserId) -> i64 {
        let slot = self.balances.slot(user);
        let _guard = slot.lock();
        self.log.sum_effective(user)
    }

    /// Recomputes every cached balance from the log.
    pub fn rebuild_balances(&self) {
        let mut users: HashSet<UserId> = self.balances.users().into_iter().collect();
        users.extend(self.directory.all().into_iter().map(|user| user.id));

        let mut drifted = 0_usize;
        for user in users {
            let slot = self.balances.slot(user);
            let mut balance = slot.lock();
            let expected = self.log.sum_effective(user);
            if *balance != expected {
                drifted += 1;
                tracing::warn!(user_id = %user, cached = *balance, expected, "Balance drift corrected");
                *balance = expected;
            }
        }
        tracing::info!(drifted, "Balances rebuilt from ledger");
    }

    /// Active one-time promotions the user has not consumed yet.
    #[must_use]
    pub fn available_promotions(&self, user: UserId, now: DateTime<Utc>) -> Vec<Promotion> {
        let consumed: HashSet<PromotionId> = self.log.consumed_promotions(user);
        self.catalog.available_for(&consumed, now)
    }
}
