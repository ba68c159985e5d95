//! Shared types, errors, and configuration for Stellar.
//!
//! This crate provides common types used across all other crates:
//! - Typed numeric IDs for users, transactions, promotions and events
//! - The `{count, results}` pagination envelope used by list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and verification for the identity boundary

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
