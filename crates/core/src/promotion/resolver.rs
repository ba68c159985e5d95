//! Purchase bonus resolution.
//!
//! Automatic promotions are always considered. One-time promotions are
//! considered only when requested and not yet consumed by the customer.
//! Ineligible requests are dropped, never reported as errors.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stellar_shared::types::PromotionId;

use super::types::{Promotion, PromotionKind};

/// Outcome of resolving promotions for one purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionResolution {
    /// Total bonus points across applied promotions.
    pub bonus: i64,
    /// Applied promotion IDs in ascending order.
    pub applied: Vec<PromotionId>,
}

/// Stateless promotion resolver.
pub struct PromotionResolver;

impl PromotionResolver {
    /// Determine which promotions apply to a purchase and their bonus.
    ///
    /// # Arguments
    /// * `spent` - Money spent on the purchase
    /// * `now` - Evaluation time for activity windows
    /// * `requested` - One-time promotion IDs the cashier entered
    /// * `candidates` - Promotions from the catalog
    /// * `consumed` - One-time promotions the customer already used
    #[must_use]
    pub fn resolve(
        spent: Decimal,
        now: DateTime<Utc>,
        requested: &[PromotionId],
        candidates: &[Promotion],
        consumed: &HashSet<PromotionId>,
    ) -> PromotionResolution {
        let requested: BTreeSet<PromotionId> = requested.iter().copied().collect();
        let mut resolution = PromotionResolution::default();

        let mut ordered: Vec<&Promotion> = candidates.iter().collect();
        ordered.sort_by_key(|p| p.id);
        ordered.dedup_by_key(|p| p.id);

        for promotion in ordered {
            let considered = match promotion.kind {
                PromotionKind::Automatic => true,
                PromotionKind::OneTime => {
                    requested.contains(&promotion.id) && !consumed.contains(&promotion.id)
                }
            };
            if !considered || !promotion.is_active_at(now) || !promotion.qualifies(spent) {
                continue;
            }

            let Some(total) = promotion
                .bonus_for(spent)
                .and_then(|bonus| resolution.bonus.checked_add(bonus))
            else {
                tracing::debug!(promotion_id = %promotion.id, "Promotion bonus overflowed, skipped");
                continue;
            };

            resolution.bonus = total;
            resolution.applied.push(promotion.id);
        }

        for id in &requested {
            if !resolution.applied.contains(id) {
                tracing::debug!(promotion_id = %id, "Requested promotion not applied");
            }
        }

        resolution
    }
}
