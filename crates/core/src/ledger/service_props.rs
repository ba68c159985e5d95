//! Property-based tests for the ledger service.
//!
//! Random operation sequences run against a small population; after every
//! step the cached balances must equal the sums recomputed from the log.
//! Sequences without adjustments must also keep every balance non-negative.

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use stellar_shared::types::{TransactionId, UserId};

use super::error::LedgerError;
use super::service::{LedgerSettings, PointsLedger};
use super::types::{
    AdjustmentInput, EventAwardInput, PurchaseInput, RedemptionInput, TransactionKind,
    TransferInput,
};
use crate::access::{Actor, Role};
use crate::promotion::{NewPromotion, PromotionCatalog, PromotionKind};
use crate::redemption::RedemptionStatus;
use crate::user::{NewUser, UserDirectory};

const USERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Award { user: usize, amount: i64 },
    Adjust { user: usize, amount: i64 },
    Transfer { from: usize, to: usize, amount: i64 },
    Request { user: usize, amount: i64 },
    Process { pick: usize },
    Cancel { pick: usize },
    Toggle { pick: usize, on: bool },
    HoldRedemption { pick: usize, on: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS, 1i64..200).prop_map(|(user, amount)| Op::Award { user, amount }),
        (0..USERS, -100i64..100).prop_map(|(user, amount)| Op::Adjust { user, amount }),
        (0..USERS, 0..USERS, -5i64..150)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (0..USERS, 0i64..150).prop_map(|(user, amount)| Op::Request { user, amount }),
        any::<usize>().prop_map(|pick| Op::Process { pick }),
        any::<usize>().prop_map(|pick| Op::Cancel { pick }),
        (any::<usize>(), any::<bool>()).prop_map(|(pick, on)| Op::Toggle { pick, on }),
    ]
}

/// Operations that never adjust a balance directly and only hold
/// redemptions still awaiting settlement.
fn settlement_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS, 1i64..200).prop_map(|(user, amount)| Op::Award { user, amount }),
        (0..USERS, 0..USERS, 1i64..150)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (0..USERS, 1i64..150).prop_map(|(user, amount)| Op::Request { user, amount }),
        any::<usize>().prop_map(|pick| Op::Process { pick }),
        any::<usize>().prop_map(|pick| Op::Cancel { pick }),
        (any::<usize>(), any::<bool>()).prop_map(|(pick, on)| Op::HoldRedemption { pick, on }),
    ]
}

struct World {
    ledger: PointsLedger,
    manager: Actor,
    cashier: Actor,
    users: Vec<Actor>,
}

fn world() -> World {
    let directory = Arc::new(UserDirectory::new());
    let add = |utorid: String, role| {
        directory
            .register(NewUser {
                utorid,
                name: "Prop User".to_string(),
                role,
                verified: true,
            })
            .unwrap()
            .as_actor()
    };
    let manager = add("manager1".to_string(), Role::Manager);
    let cashier = add("cashier1".to_string(), Role::Cashier);
    let users = (0..USERS).map(|i| add(format!("user{i}"), Role::Regular)).collect();
    World {
        ledger: PointsLedger::new(
            LedgerSettings::default(),
            directory,
            Arc::new(PromotionCatalog::new()),
        ),
        manager,
        cashier,
        users,
    }
}

fn nth_row(ledger: &PointsLedger, pick: usize) -> Option<TransactionId> {
    let len = ledger.log.len();
    if len == 0 {
        return None;
    }
    Some(TransactionId::new(i64::try_from(pick % len).unwrap() + 1))
}

fn apply(w: &World, op: &Op) {
    let ledger = &w.ledger;
    let _ = match *op {
        Op::Award { user, amount } => ledger
            .award_event(
                &w.manager,
                EventAwardInput {
                    utorid: w.users[user].utorid.clone(),
                    amount,
                    event_id: None,
                    remark: String::new(),
                },
            )
            .map(drop),
        Op::Adjust { user, amount } => {
            let owner = w.users[user].id;
            let related = ledger
                .log
                .select(|tx| tx.owner == owner)
                .first()
                .map_or(TransactionId::new(0), |tx| tx.id);
            ledger
                .adjust(
                    &w.manager,
                    AdjustmentInput {
                        utorid: w.users[user].utorid.clone(),
                        amount,
                        related_id: related,
                        remark: String::new(),
                    },
                )
                .map(drop)
        }
        Op::Transfer { from, to, amount } => ledger
            .transfer(
                &w.users[from],
                TransferInput {
                    recipient: w.users[to].id,
                    amount,
                    remark: String::new(),
                },
            )
            .map(drop),
        Op::Request { user, amount } => ledger
            .request_redemption(
                &w.users[user],
                RedemptionInput {
                    amount,
                    remark: String::new(),
                },
            )
            .map(drop),
        Op::Process { pick } => match nth_row(ledger, pick) {
            Some(id) => ledger.process_redemption(&w.cashier, id).map(drop),
            None => Ok(()),
        },
        Op::Cancel { pick } => match nth_row(ledger, pick) {
            Some(id) => ledger.cancel_redemption(&w.cashier, id).map(drop),
            None => Ok(()),
        },
        Op::Toggle { pick, on } => match nth_row(ledger, pick) {
            Some(id) => ledger.set_suspicious(&w.manager, id, on).map(drop),
            None => Ok(()),
        },
        Op::HoldRedemption { pick, on } => {
            let pending = ledger
                .log
                .select(|tx| tx.redemption_status() == Some(RedemptionStatus::Pending));
            if pending.is_empty() {
                Ok(())
            } else {
                let id = pending[pick % pending.len()].id;
                ledger.set_suspicious(&w.manager, id, on).map(drop)
            }
        }
    };
}

fn assert_consistent(w: &World) -> Result<(), TestCaseError> {
    for user in &w.users {
        prop_assert_eq!(w.ledger.balance(user.id), w.ledger.log.sum_effective(user.id));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Balance consistency
    // =========================================================================

    /// Cached balance equals the log sum after every operation.
    #[test]
    fn prop_balance_matches_ledger(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let w = world();
        for op in &ops {
            apply(&w, op);
            assert_consistent(&w)?;
        }
    }

    /// Rebuilding from the log is a no-op on a consistent ledger.
    #[test]
    fn prop_rebuild_is_noop(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let w = world();
        for op in &ops {
            apply(&w, op);
        }
        let before: Vec<i64> = w.users.iter().map(|u| w.ledger.balance(u.id)).collect();
        w.ledger.rebuild_balances();
        let after: Vec<i64> = w.users.iter().map(|u| w.ledger.balance(u.id)).collect();
        prop_assert_eq!(before, after);
    }

    /// Without adjustments no balance goes negative, and a redemption is
    /// never settled while on hold.
    #[test]
    fn prop_settlement_keeps_balances_non_negative(
        ops in prop::collection::vec(settlement_op_strategy(), 1..60),
    ) {
        let w = world();
        for op in &ops {
            apply(&w, op);
            assert_consistent(&w)?;
            for user in &w.users {
                prop_assert!(w.ledger.balance(user.id) >= 0);
            }
            let settled_on_hold = w.ledger.log.select(|tx| {
                tx.suspicious && tx.redemption_status() == Some(RedemptionStatus::Fulfilled)
            });
            prop_assert!(settled_on_hold.is_empty());
        }
    }

    // =========================================================================
    // Transfer atomicity
    // =========================================================================

    /// A transfer yields two mirrored rows or none at all.
    #[test]
    fn prop_transfer_all_or_nothing(funds in 0i64..300, amount in -10i64..400) {
        let w = world();
        if funds > 0 {
            apply(&w, &Op::Award { user: 0, amount: funds });
        }
        let rows = w.ledger.log.len();
        let result = w.ledger.transfer(
            &w.users[0],
            TransferInput { recipient: w.users[1].id, amount, remark: String::new() },
        );

        match result {
            Ok((sent, received)) => {
                prop_assert!(amount > 0 && amount <= funds);
                prop_assert_eq!(w.ledger.log.len(), rows + 2);
                prop_assert_eq!(sent.amount, -received.amount);
                prop_assert_eq!(sent.related_id(), Some(received.id.into_inner()));
                prop_assert_eq!(received.related_id(), Some(sent.id.into_inner()));
                prop_assert_eq!(w.ledger.balance(w.users[0].id), funds - amount);
                prop_assert_eq!(w.ledger.balance(w.users[1].id), amount);
            }
            Err(err) => {
                let expected_error = matches!(
                    err,
                    LedgerError::InvalidAmount(_) | LedgerError::InsufficientBalance { .. }
                );
                prop_assert!(expected_error);
                prop_assert_eq!(w.ledger.log.len(), rows);
                prop_assert_eq!(w.ledger.balance(w.users[0].id), funds.max(0));
                prop_assert_eq!(w.ledger.balance(w.users[1].id), 0);
            }
        }
    }

    // =========================================================================
    // One-time promotion idempotence
    // =========================================================================

    /// A one-time promotion is applied to a user at most once.
    #[test]
    fn prop_one_time_promotion_consumed_once(
        spends in prop::collection::vec(1i64..10_000, 1..8),
    ) {
        let w = world();
        let now = Utc::now();
        let promo = w.ledger.catalog().create(NewPromotion {
            name: "Welcome".to_string(),
            description: String::new(),
            kind: PromotionKind::OneTime,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            min_spending: None,
            rate: None,
            points: Some(25),
        }).unwrap();

        let mut applied = 0;
        for cents in spends {
            let tx = w.ledger.purchase(&w.cashier, PurchaseInput {
                utorid: w.users[0].utorid.clone(),
                spent: Decimal::new(cents, 2),
                promotion_ids: vec![promo.id],
                remark: String::new(),
            }).unwrap();
            if tx.promotion_ids().contains(&promo.id) {
                applied += 1;
            }
        }
        prop_assert_eq!(applied, 1);
    }

    // =========================================================================
    // Suspicious toggle involution
    // =========================================================================

    /// Holding then clearing a row restores the owner's balance exactly.
    #[test]
    fn prop_suspicious_toggle_restores_balance(
        amounts in prop::collection::vec(1i64..500, 1..6),
        pick in any::<usize>(),
    ) {
        let w = world();
        for amount in &amounts {
            apply(&w, &Op::Award { user: 0, amount: *amount });
        }
        let owner: UserId = w.users[0].id;
        let before = w.ledger.balance(owner);
        let id = nth_row(&w.ledger, pick).unwrap();
        let row = w.ledger.set_suspicious(&w.manager, id, true).unwrap();
        prop_assert_eq!(w.ledger.balance(owner), before - row.amount);
        w.ledger.set_suspicious(&w.manager, id, false).unwrap();
        prop_assert_eq!(w.ledger.balance(owner), before);
    }

    // =========================================================================
    // Redemption non-double-spend
    // =========================================================================

    /// Processing twice debits once and fails the second time.
    #[test]
    fn prop_redemption_debited_once(funds in 1i64..500, ratio in 1i64..=100) {
        let w = world();
        apply(&w, &Op::Award { user: 0, amount: funds });
        let amount = (funds * ratio / 100).max(1);
        let pending = w.ledger.request_redemption(
            &w.users[0],
            RedemptionInput { amount, remark: String::new() },
        ).unwrap();
        prop_assert_eq!(pending.kind(), TransactionKind::Redemption);

        let done = w.ledger.process_redemption(&w.cashier, pending.id).unwrap();
        prop_assert_eq!(done.redemption_status(), Some(RedemptionStatus::Fulfilled));
        let second = w.ledger.process_redemption(&w.cashier, pending.id);
        prop_assert!(matches!(second, Err(LedgerError::AlreadyProcessed(_))));
        prop_assert_eq!(w.ledger.balance(w.users[0].id), funds - amount);
    }
}
