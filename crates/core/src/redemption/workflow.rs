//! Redemption request, processing and cancellation.

use chrono::Utc;

use stellar_shared::types::TransactionId;

use super::types::RedemptionStatus;
use crate::access::{AccessGate, Actor, Operation};
use crate::ledger::types::{RedemptionInput, Transaction, TransactionDetail};
use crate::ledger::{LedgerError, PointsLedger};

impl PointsLedger {
    /// Requests a redemption of the actor's own points.
    ///
    /// The balance must cover the amount now but is not debited. The
    /// returned row is pending with `amount = 0`; its ID is what the user
    /// presents to a cashier.
    pub fn request_redemption(
        &self,
        actor: &Actor,
        input: RedemptionInput,
    ) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::RequestRedemption, Some(actor.id))?;
        if input.amount <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "redemption amount must be positive, got {}",
                input.amount
            )));
        }

        let slot = self.balances.slot(actor.id);
        let balance = slot.lock();
        if *balance < input.amount {
            tracing::warn!(
                owner = %actor.utorid,
                available = *balance,
                requested = input.amount,
                "Redemption request rejected: insufficient balance"
            );
            return Err(LedgerError::InsufficientBalance {
                available: *balance,
                requested: input.amount,
            });
        }

        let tx = self.log.append(|id| Transaction {
            id,
            owner: actor.id,
            utorid: actor.utorid.clone(),
            amount: 0,
            suspicious: false,
            created_by: actor.utorid.clone(),
            remark: input.remark,
            created_at: Utc::now(),
            detail: TransactionDetail::Redemption {
                redeemed: input.amount,
                status: RedemptionStatus::Pending,
                processed_by: None,
                processed_at: None,
            },
        });

        tracing::info!(
            transaction_id = %tx.id,
            owner = %tx.utorid,
            redeemed = input.amount,
            "Redemption requested"
        );
        Ok(tx)
    }

    /// Fulfils a pending redemption, debiting the owner.
    ///
    /// The owner's balance is re-checked at this point. On a shortfall the
    /// request stays pending and may be processed again later. A request
    /// under a suspicious hold is refused until a manager clears it.
    pub fn process_redemption(
        &self,
        actor: &Actor,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        AccessGate::authorize(actor, Operation::ProcessRedemption, None)?;
        let owner = self
            .log
            .owner_of(id)
            .ok_or(LedgerError::UnknownTransaction(id))?;

        let slot = self.balances.slot(owner);
        let mut balance = slot.lock();
        let row = self.log.get(id).ok_or(LedgerError::UnknownTransaction(id))?;
        let TransactionDetail::Redemption {
            redeemed, status, ..
        } = row.detail
        else {
            return Err(LedgerError::NotARedemption(id));
        };
        let next = status.fulfil(id)?;
        if row.suspicious {
            tracing::warn!(
                transaction_id = %id,
                owner = %row.utorid,
                "Redemption processing rejected: on hold"
            );
            return Err(LedgerError::Held(id));
        }

        if *balance < redeemed {
            tracing::warn!(
                transaction_id = %id,
                owner = %row.utorid,
                available = *balance,
                requested = redeemed,
                "Redemption processing rejected: insufficient balance"
            );
            return Err(LedgerError::InsufficientBalance {
                available: *balance,
                requested: redeemed,
            });
        }

        let now = Utc::now();
        let (tx, delta) = self
            .log
            .update(id, |tx| {
                let before = tx.effective_amount();
                tx.amount = -redeemed;
                tx.detail = TransactionDetail::Redemption {
                    redeemed,
                    status: next,
                    processed_by: Some(actor.utorid.clone()),
                    processed_at: Some(now),
                };
                (tx.clone(), tx.effective_amount() - before)
            })
            .ok_or(LedgerError::UnknownTransaction(id))?;
        *balance += delta;

        tracing::info!(
            transaction_id = %id,
            owner = %tx.utorid,
            amount = tx.amount,
            processed_by = %actor.utorid,
            "Redemption fulfilled"
        );
        Ok(tx)
    }

    /// Withdraws a pending redemption. The balance is unaffected.
    ///
    /// Owners may cancel their own requests; cashiers and above any request.
    pub fn cancel_redemption(
        &self,
        actor: &Actor,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let owner = self.log.owner_of(id);
        AccessGate::authorize(actor, Operation::CancelRedemption, owner)?;
        let owner = owner.ok_or(LedgerError::UnknownTransaction(id))?;

        let slot = self.balances.slot(owner);
        let _balance = slot.lock();
        let row = self.log.get(id).ok_or(LedgerError::UnknownTransaction(id))?;
        let TransactionDetail::Redemption {
            redeemed, status, ..
        } = row.detail
        else {
            return Err(LedgerError::NotARedemption(id));
        };
        let next = status.cancel(id)?;

        let now = Utc::now();
        let tx = self
            .log
            .update(id, |tx| {
                tx.detail = TransactionDetail::Redemption {
                    redeemed,
                    status: next,
                    processed_by: Some(actor.utorid.clone()),
                    processed_at: Some(now),
                };
                tx.clone()
            })
            .ok_or(LedgerError::UnknownTransaction(id))?;

        tracing::info!(
            transaction_id = %id,
            owner = %tx.utorid,
            cancelled_by = %actor.utorid,
            "Redemption cancelled"
        );
        Ok(tx)
    }
}
