//! Core business logic for Stellar.
//!
//! This crate contains the points ledger with ZERO web dependencies.
//! All domain types, validation rules, and balance arithmetic live here.
//!
//! # Modules
//!
//! - `access` - Role ordering and the authorization gate
//! - `user` - User directory (handles, roles, verification)
//! - `promotion` - Promotion catalog and purchase bonus resolution
//! - `ledger` - Append-only transaction log, balance projection, ledger service
//! - `redemption` - Two-phase redemption workflow (request, process, cancel)

pub mod access;
pub mod ledger;
pub mod promotion;
pub mod redemption;
pub mod user;

pub use access::{AccessGate, Actor, Operation, Role};
pub use ledger::{LedgerError, LedgerSettings, PointsLedger, Transaction, TransactionRecord};
pub use promotion::{Promotion, PromotionCatalog, PromotionResolver};
pub use redemption::RedemptionStatus;
pub use user::{User, UserDirectory};
