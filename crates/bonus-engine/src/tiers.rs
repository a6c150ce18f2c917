//! Tier admission control: add, edit and remove bonus tiers.

use crate::error::{check_amount, check_percent, into_result, BonusError};
use crate::settings::{BonusSettings, BonusTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Addresses a tier either by its current position or by its stable id.
/// Positions shift down when an earlier tier is removed; ids never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRef {
    Position(usize),
    Id(Uuid),
}

impl FromStr for TierRef {
    type Err = BonusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(position) = s.parse::<usize>() {
            return Ok(Self::Position(position));
        }
        Uuid::parse_str(s)
            .map(Self::Id)
            .map_err(|_| BonusError::field("tier", "must be a position or a tier id"))
    }
}

impl fmt::Display for TierRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(p) => write!(f, "tier at position {p}"),
            Self::Id(id) => write!(f, "tier {id}"),
        }
    }
}

/// Whether edits re-check the admission invariants.
///
/// The default only enforces `min < max` and non-overlap when a tier is
/// added; edits are applied as-is and can leave overlapping ranges behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierPolicy {
    pub revalidate_on_update: bool,
}

/// Candidate tier for [`add_tier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTier {
    pub min_deposit: f64,
    pub max_deposit: f64,
    pub bonus_percent: f64,
    #[serde(default)]
    pub active: Option<bool>,
}

impl NewTier {
    pub fn validate(&self) -> Result<(), BonusError> {
        let mut errors = Vec::new();
        check_amount(&mut errors, "minDeposit", self.min_deposit);
        check_amount(&mut errors, "maxDeposit", self.max_deposit);
        check_percent(&mut errors, "bonusPercent", self.bonus_percent);
        into_result(errors)
    }
}

/// Partial tier edit. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPatch {
    pub min_deposit: Option<f64>,
    pub max_deposit: Option<f64>,
    pub bonus_percent: Option<f64>,
    pub active: Option<bool>,
}

impl TierPatch {
    pub fn validate(&self) -> Result<(), BonusError> {
        let mut errors = Vec::new();
        if let Some(v) = self.min_deposit {
            check_amount(&mut errors, "minDeposit", v);
        }
        if let Some(v) = self.max_deposit {
            check_amount(&mut errors, "maxDeposit", v);
        }
        if let Some(v) = self.bonus_percent {
            check_percent(&mut errors, "bonusPercent", v);
        }
        into_result(errors)
    }
}

fn resolve(tiers: &[BonusTier], tier: TierRef) -> Result<usize, BonusError> {
    let index = match tier {
        TierRef::Position(p) if p < tiers.len() => Some(p),
        TierRef::Position(_) => None,
        TierRef::Id(id) => tiers.iter().position(|t| t.id == id),
    };
    index.ok_or_else(|| BonusError::NotFound(tier.to_string()))
}

fn check_admission<'a>(
    min: f64,
    max: f64,
    others: impl IntoIterator<Item = &'a BonusTier>,
) -> Result<(), BonusError> {
    if min >= max {
        return Err(BonusError::InvalidRange { min, max });
    }
    if let Some(existing) = others.into_iter().find(|t| t.overlaps(min, max)) {
        return Err(BonusError::Overlap {
            tier_id: existing.id,
            min: existing.min_deposit,
            max: existing.max_deposit,
        });
    }
    Ok(())
}

/// Append a tier after checking its range against every existing tier.
/// Insertion order is lookup priority.
pub fn add_tier<'a>(
    settings: &'a mut BonusSettings,
    candidate: &NewTier,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<&'a BonusTier, BonusError> {
    candidate.validate()?;
    check_admission(candidate.min_deposit, candidate.max_deposit, &settings.tiers)?;

    settings.tiers.push(BonusTier {
        id: Uuid::new_v4(),
        min_deposit: candidate.min_deposit,
        max_deposit: candidate.max_deposit,
        bonus_percent: candidate.bonus_percent,
        active: candidate.active.unwrap_or(true),
    });
    settings.touch(actor, now);

    let last = settings.tiers.len() - 1;
    Ok(&settings.tiers[last])
}

/// Apply a partial edit to one tier.
pub fn update_tier<'a>(
    settings: &'a mut BonusSettings,
    tier: TierRef,
    patch: &TierPatch,
    policy: TierPolicy,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<&'a BonusTier, BonusError> {
    let index = resolve(&settings.tiers, tier)?;
    patch.validate()?;

    let mut next = settings.tiers[index].clone();
    if let Some(v) = patch.min_deposit {
        next.min_deposit = v;
    }
    if let Some(v) = patch.max_deposit {
        next.max_deposit = v;
    }
    if let Some(v) = patch.bonus_percent {
        next.bonus_percent = v;
    }
    if let Some(v) = patch.active {
        next.active = v;
    }

    if policy.revalidate_on_update {
        let others = settings
            .tiers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, t)| t);
        check_admission(next.min_deposit, next.max_deposit, others)?;
    }

    settings.tiers[index] = next;
    settings.touch(actor, now);
    Ok(&settings.tiers[index])
}

/// Remove one tier. Later positions shift down by one.
pub fn remove_tier(
    settings: &mut BonusSettings,
    tier: TierRef,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<BonusTier, BonusError> {
    let index = resolve(&settings.tiers, tier)?;
    let removed = settings.tiers.remove(index);
    settings.touch(actor, now);
    Ok(removed)
}
