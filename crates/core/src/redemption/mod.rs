//! Two-phase redemption.
//!
//! A user requests a redemption, which records a pending row with
//! `amount = 0` and does not touch the balance. A cashier later processes
//! it, debiting the owner and stamping the row, or the owner (or staff)
//! cancels it. Pending requests do not expire.

pub mod types;
pub mod workflow;

pub use types::RedemptionStatus;
