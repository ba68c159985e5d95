//! In-process promotion catalog.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use stellar_shared::types::PromotionId;

use super::error::PromotionError;
use super::types::{NewPromotion, Promotion, PromotionKind};

/// Catalog of promotions keyed by ID.
#[derive(Debug)]
pub struct PromotionCatalog {
    promotions: RwLock<BTreeMap<PromotionId, Promotion>>,
    next_id: AtomicI64,
}

impl Default for PromotionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PromotionCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            promotions: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Validates and adds a promotion.
    pub fn create(&self, input: NewPromotion) -> Result<Promotion, PromotionError> {
        input.validate()?;
        let id = PromotionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let promotion = input.into_promotion(id);
        self.promotions.write().insert(id, promotion.clone());
        tracing::info!(promotion_id = %id, kind = ?promotion.kind, "Promotion created");
        Ok(promotion)
    }

    /// Looks up a promotion.
    pub fn get(&self, id: PromotionId) -> Result<Promotion, PromotionError> {
        self.promotions
            .read()
            .get(&id)
            .cloned()
            .ok_or(PromotionError::NotFound(id))
    }

    /// Promotions active at `now`, ordered by ID.
    #[must_use]
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Promotion> {
        self.promotions
            .read()
            .values()
            .filter(|p| p.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Active one-time promotions the user has not consumed yet.
    #[must_use]
    pub fn available_for(
        &self,
        consumed: &HashSet<PromotionId>,
        now: DateTime<Utc>,
    ) -> Vec<Promotion> {
        self.active_at(now)
            .into_iter()
            .filter(|p| p.kind == PromotionKind::OneTime && !consumed.contains(&p.id))
            .collect()
    }

    /// Every promotion, ordered by ID.
    #[must_use]
    pub fn all(&self) -> Vec<Promotion> {
        self.promotions.read().values().cloned().collect()
    }
}
