//! Authorization for ledger operations.
//!
//! - `role` - The closed, totally ordered role enumeration
//! - `gate` - Per-operation role floors and ownership checks

pub mod gate;
pub mod role;

pub use gate::{AccessDenied, AccessGate, Actor, Operation, Ownership, Policy};
pub use role::Role;
