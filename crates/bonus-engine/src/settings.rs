//! The singleton bonus configuration and its partial-update patch.

use crate::error::{check_amount, check_percent, into_result, BonusError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A deposit range with its own bonus percentage. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusTier {
    /// Stable identifier, assigned once at creation.
    pub id: Uuid,
    pub min_deposit: f64,
    pub max_deposit: f64,
    pub bonus_percent: f64,
    pub active: bool,
}

impl BonusTier {
    #[inline]
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min_deposit && amount <= self.max_deposit
    }

    /// Whether `[min, max]` shares more than a boundary point with this tier.
    /// Touching ranges (`[0, 50]` and `[50, 100]`) do not overlap.
    #[inline]
    pub fn overlaps(&self, min: f64, max: f64) -> bool {
        min < self.max_deposit && self.min_deposit < max
    }
}

/// Bonus configuration. Exactly one exists per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusSettings {
    pub enabled: bool,
    pub regular_bonus_percent: f64,
    pub first_deposit_bonus_enabled: bool,
    pub first_deposit_bonus_percent: f64,
    pub min_deposit_for_bonus: f64,
    /// 0 means uncapped.
    pub max_bonus_amount: f64,
    pub use_tier_bonus: bool,
    #[serde(default)]
    pub tiers: Vec<BonusTier>,
    #[serde(default)]
    pub last_updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BonusSettings {
    /// The record created on first access.
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            regular_bonus_percent: 0.0,
            first_deposit_bonus_enabled: false,
            first_deposit_bonus_percent: 0.0,
            min_deposit_for_bonus: 0.0,
            max_bonus_amount: 0.0,
            use_tier_bonus: false,
            tiers: Vec::new(),
            last_updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.last_updated_by = Some(actor.to_string());
        self.updated_at = now;
    }
}

impl Default for BonusSettings {
    fn default() -> Self {
        Self::new_default(Utc::now())
    }
}

/// Partial update of the scalar settings. Absent fields keep their value.
/// Tiers are managed through their own operations and are ignored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub regular_bonus_percent: Option<f64>,
    pub first_deposit_bonus_enabled: Option<bool>,
    pub first_deposit_bonus_percent: Option<f64>,
    pub min_deposit_for_bonus: Option<f64>,
    pub max_bonus_amount: Option<f64>,
    pub use_tier_bonus: Option<bool>,
}

impl SettingsPatch {
    /// Collect every out-of-range field.
    pub fn validate(&self) -> Result<(), BonusError> {
        let mut errors = Vec::new();
        if let Some(v) = self.regular_bonus_percent {
            check_percent(&mut errors, "regularBonusPercent", v);
        }
        if let Some(v) = self.first_deposit_bonus_percent {
            check_percent(&mut errors, "firstDepositBonusPercent", v);
        }
        if let Some(v) = self.min_deposit_for_bonus {
            check_amount(&mut errors, "minDepositForBonus", v);
        }
        if let Some(v) = self.max_bonus_amount {
            check_amount(&mut errors, "maxBonusAmount", v);
        }
        into_result(errors)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate, then apply present fields and stamp the audit fields.
    pub fn apply(
        &self,
        settings: &mut BonusSettings,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BonusError> {
        self.validate()?;

        if let Some(v) = self.enabled {
            settings.enabled = v;
        }
        if let Some(v) = self.regular_bonus_percent {
            settings.regular_bonus_percent = v;
        }
        if let Some(v) = self.first_deposit_bonus_enabled {
            settings.first_deposit_bonus_enabled = v;
        }
        if let Some(v) = self.first_deposit_bonus_percent {
            settings.first_deposit_bonus_percent = v;
        }
        if let Some(v) = self.min_deposit_for_bonus {
            settings.min_deposit_for_bonus = v;
        }
        if let Some(v) = self.max_bonus_amount {
            settings.max_bonus_amount = v;
        }
        if let Some(v) = self.use_tier_bonus {
            settings.use_tier_bonus = v;
        }

        settings.touch(actor, now);
        Ok(())
    }
}
