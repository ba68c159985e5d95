//! User directory.
//!
//! Users are created at registration and never deleted. Profile CRUD
//! lives outside the ledger; only the fields the ledger consults
//! (handle, role, verification, suspicion) are kept here.

pub mod directory;
pub mod error;

pub use directory::{NewUser, User, UserDirectory};
pub use error::DirectoryError;
