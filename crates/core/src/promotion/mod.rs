//! Promotions and purchase bonus resolution.
//!
//! - `types` - Promotion definitions and per-purchase contribution math
//! - `error` - Catalog validation errors
//! - `catalog` - In-process promotion catalog
//! - `resolver` - Decides which promotions apply to a purchase

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod types;


pub use catalog::PromotionCatalog;
pub use error::PromotionError;
pub use resolver::{PromotionResolution, PromotionResolver};
pub use types::{NewPromotion, Promotion, PromotionKind, floor_points};
