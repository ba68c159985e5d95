//! Promotion domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use stellar_shared::types::PromotionId;

use super::error::PromotionError;

/// How a promotion is applied to purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionKind {
    /// Applies to every qualifying purchase without being requested.
    Automatic,
    /// Must be requested; each user may consume it once.
    OneTime,
}

impl PromotionKind {
    /// Parses a kind from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "automatic" => Some(Self::Automatic),
            "one-time" | "onetime" | "one_time" => Some(Self::OneTime),
            _ => None,
        }
    }
}

/// Points for `amount × rate`, rounded down.
///
/// Returns `None` if the product does not fit.
#[must_use]
pub fn floor_points(amount: Decimal, rate: Decimal) -> Option<i64> {
    amount.checked_mul(rate)?.floor().to_i64()
}

/// A promotion in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Promotion ID.
    pub id: PromotionId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Automatic or one-time.
    #[serde(rename = "type")]
    pub kind: PromotionKind,
    /// Start of the activity window (inclusive).
    pub start_time: DateTime<Utc>,
    /// End of the activity window (exclusive).
    pub end_time: DateTime<Utc>,
    /// Minimum amount spent for the promotion to qualify.
    pub min_spending: Option<Decimal>,
    /// Extra points per currency unit spent.
    pub rate: Option<Decimal>,
    /// Fixed points awarded.
    pub points: Option<i64>,
}

impl Promotion {
    /// Returns true if the promotion is active at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }

    /// Returns true if a purchase of `spent` meets the spending threshold.
    #[must_use]
    pub fn qualifies(&self, spent: Decimal) -> bool {
        self.min_spending.is_none_or(|min| spent >= min)
    }

    /// Bonus points this promotion contributes to a purchase of `spent`.
    ///
    /// Fixed award plus `floor(spent × rate)`. `None` on overflow.
    #[must_use]
    pub fn bonus_for(&self, spent: Decimal) -> Option<i64> {
        let fixed = self.points.unwrap_or(0);
        let rated = match self.rate {
            Some(rate) => floor_points(spent, rate)?,
            None => 0,
        };
        fixed.checked_add(rated)
    }
}

/// Input for creating a promotion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Automatic or one-time.
    #[serde(rename = "type")]
    pub kind: PromotionKind,
    /// Start of the activity window.
    pub start_time: DateTime<Utc>,
    /// End of the activity window.
    pub end_time: DateTime<Utc>,
    /// Minimum spending threshold.
    #[serde(default)]
    pub min_spending: Option<Decimal>,
    /// Rate bonus.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Fixed award.
    #[serde(default)]
    pub points: Option<i64>,
}

impl NewPromotion {
    /// Validates the definition.
    pub fn validate(&self) -> Result<(), PromotionError> {
        if self.name.trim().is_empty() {
            return Err(PromotionError::NameRequired);
        }
        if self.end_time <= self.start_time {
            return Err(PromotionError::InvalidWindow);
        }
        if self.rate.is_none() && self.points.is_none() {
            return Err(PromotionError::NoReward);
        }
        if self.rate.is_some_and(|r| r.is_sign_negative()) {
            return Err(PromotionError::NegativeValue("rate"));
        }
        if self.points.is_some_and(|p| p < 0) {
            return Err(PromotionError::NegativeValue("points"));
        }
        if self.min_spending.is_some_and(|m| m.is_sign_negative()) {
            return Err(PromotionError::NegativeValue("minSpending"));
        }
        Ok(())
    }

    /// Builds the catalog entry with its assigned ID.
    #[must_use]
    pub fn into_promotion(self, id: PromotionId) -> Promotion {
        Promotion {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            kind: self.kind,
            start_time: self.start_time,
            end_time: self.end_time,
            min_spending: self.min_spending,
            rate: self.rate,
            points: self.points,
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn promotion(rate: Option<Decimal>, points: Option<i64>) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: PromotionId::new(1),
            name: "Spring".to_string(),
            description: String::new(),
            kind: PromotionKind::Automatic,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            min_spending: Some(dec!(20)),
            rate,
            points,
        }
    }

    #[test]
    fn test_floor_points() {
        assert_eq!(floor_points(dec!(50), dec!(0.05)), Some(2));
        assert_eq!(floor_points(dec!(19.99), dec!(4)), Some(79));
        assert_eq!(floor_points(dec!(0.24), dec!(4)), Some(0));
        assert_eq!(floor_points(Decimal::MAX, dec!(2)), None);
    }

    #[test]
    fn test_bonus_for() {
        assert_eq!(promotion(Some(dec!(0.05)), Some(10)).bonus_for(dec!(50)), Some(12));
        assert_eq!(promotion(None, Some(10)).bonus_for(dec!(50)), Some(10));
        assert_eq!(promotion(Some(dec!(0.05)), None).bonus_for(dec!(50)), Some(2));
    }

    #[test]
    fn test_window_is_half_open() {
        let p = promotion(None, Some(1));
        assert!(p.is_active_at(p.start_time));
        assert!(!p.is_active_at(p.end_time));
        assert!(!p.is_active_at(p.start_time - Duration::seconds(1)));
    }

    #[test]
    fn test_qualifies() {
        let p = promotion(None, Some(1));
        assert!(p.qualifies(dec!(20)));
        assert!(!p.qualifies(dec!(19.99)));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(PromotionKind::parse("automatic"), Some(PromotionKind::Automatic));
        assert_eq!(PromotionKind::parse("one-time"), Some(PromotionKind::OneTime));
        assert_eq!(PromotionKind::parse("weekly"), None);
    }

    #[test]
    fn test_new_promotion_validation() {
        let now = Utc::now();
        let valid = NewPromotion {
            name: "Launch".to_string(),
            description: String::new(),
            kind: PromotionKind::OneTime,
            start_time: now,
            end_time: now + Duration::days(7),
            min_spending: None,
            rate: None,
            points: Some(50),
        };
        assert!(valid.validate().is_ok());

        let mut no_reward = valid.clone();
        no_reward.points = None;
        assert!(matches!(no_reward.validate(), Err(PromotionError::NoReward)));

        let mut backwards = valid.clone();
        backwards.end_time = now - Duration::days(1);
        assert!(matches!(backwards.validate(), Err(PromotionError::InvalidWindow)));

        let mut negative = valid;
        negative.rate = Some(dec!(-0.1));
        assert!(matches!(
            negative.validate(),
            Err(PromotionError::NegativeValue("rate"))
        ));
    }
}
