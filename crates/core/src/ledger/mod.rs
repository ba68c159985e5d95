//! Points ledger.
//!
//! This module implements the transaction-processing engine:
//! - Tagged transaction kinds sharing a common envelope
//! - The append-only transaction log (source of truth)
//! - The per-user balance projection and its locks
//! - The ledger service that authorizes, validates and commits
//! - Transaction listing and filtering
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod filter;
pub mod log;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::BalanceStore;
pub use error::LedgerError;
pub use filter::{AmountOperator, ListScope, TransactionFilter};
pub use log::TransactionLog;
pub use service::{LedgerSettings, PointsLedger};
pub use types::{
    AdjustmentInput, EventAwardInput, PurchaseInput, RedemptionInput, Transaction,
    TransactionDetail, TransactionKind, TransactionRecord, TransactionRequest, TransferInput,
};
