//! Bonus calculation and tier resolution.

use crate::settings::{BonusSettings, BonusTier};
use serde::Serialize;

/// Which rule produced the applied percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BonusSource {
    Disabled,
    BelowMinimum,
    FirstDeposit,
    Tier,
    Regular,
}

/// Full breakdown of a bonus computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusQuote {
    pub deposit_amount: f64,
    pub bonus_amount: f64,
    pub total_credit: f64,
    pub applied_percent: f64,
    pub source: BonusSource,
    pub capped: bool,
}

/// Round to cents, half away from zero.
#[inline]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First active tier whose inclusive range contains `amount`, in stored order.
pub fn find_tier(tiers: &[BonusTier], amount: f64) -> Option<&BonusTier> {
    tiers.iter().find(|t| t.active && t.contains(amount))
}

/// Compute the bonus for a deposit. `amount` must be finite and non-negative;
/// callers validate before calling.
pub fn quote(settings: &BonusSettings, amount: f64, is_first_deposit: bool) -> BonusQuote {
    let zero = |source| BonusQuote {
        deposit_amount: amount,
        bonus_amount: 0.0,
        total_credit: round_cents(amount),
        applied_percent: 0.0,
        source,
        capped: false,
    };

    if !settings.enabled {
        return zero(BonusSource::Disabled);
    }
    if amount < settings.min_deposit_for_bonus {
        return zero(BonusSource::BelowMinimum);
    }

    let (percent, source) = if is_first_deposit && settings.first_deposit_bonus_enabled {
        (settings.first_deposit_bonus_percent, BonusSource::FirstDeposit)
    } else if settings.use_tier_bonus && !settings.tiers.is_empty() {
        let percent = find_tier(&settings.tiers, amount).map_or(0.0, |t| t.bonus_percent);
        (percent, BonusSource::Tier)
    } else {
        (settings.regular_bonus_percent, BonusSource::Regular)
    };

    let mut bonus = amount * (percent / 100.0);
    let capped = settings.max_bonus_amount > 0.0 && bonus > settings.max_bonus_amount;
    if capped {
        bonus = settings.max_bonus_amount;
    }
    let bonus = round_cents(bonus).max(0.0);

    BonusQuote {
        deposit_amount: amount,
        bonus_amount: bonus,
        total_credit: round_cents(amount + bonus),
        applied_percent: percent,
        source,
        capped,
    }
}

/// Bonus amount only. See [`quote`].
pub fn compute_bonus(settings: &BonusSettings, amount: f64, is_first_deposit: bool) -> f64 {
    quote(settings, amount, is_first_deposit).bonus_amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn regular(pct: f64, min: f64, cap: f64) -> BonusSettings {
        let mut s = BonusSettings::default();
        s.regular_bonus_percent = pct;
        s.min_deposit_for_bonus = min;
        s.max_bonus_amount = cap;
        s
    }

    fn tier(min: f64, max: f64, pct: f64, active: bool) -> BonusTier {
        BonusTier {
            id: Uuid::new_v4(),
            min_deposit: min,
            max_deposit: max,
            bonus_percent: pct,
            active,
        }
    }

    fn is_cents(v: f64) -> bool {
        ((v * 100.0).round() - v * 100.0).abs() < 1e-6
    }

    #[test]
    fn test_regular_rate() {
        let s = regular(10.0, 100.0, 0.0);
        assert_eq!(compute_bonus(&s, 500.0, false), 50.0);
    }

    #[test]
    fn test_cap_applies() {
        let s = regular(10.0, 100.0, 30.0);
        let q = quote(&s, 500.0, false);
        assert_eq!(q.bonus_amount, 30.0);
        assert!(q.capped);
        assert_eq!(q.total_credit, 530.0);
    }

    #[test]
    fn test_disabled_is_always_zero() {
        let mut s = regular(50.0, 0.0, 0.0);
        s.enabled = false;
        s.first_deposit_bonus_enabled = true;
        s.first_deposit_bonus_percent = 100.0;
        for amount in [0.0, 1.0, 99.99, 1_000_000.0] {
            let q = quote(&s, amount, true);
            assert_eq!(q.bonus_amount, 0.0);
            assert_eq!(q.source, BonusSource::Disabled);
        }
    }

    #[test]
    fn test_below_minimum_is_zero() {
        let s = regular(10.0, 100.0, 0.0);
        for amount in [0.0, 50.0, 99.99] {
            assert_eq!(compute_bonus(&s, amount, false), 0.0);
        }
        assert_eq!(compute_bonus(&s, 100.0, false), 10.0);
    }

    #[test]
    fn test_tier_lookup() {
        let mut s = regular(1.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        s.tiers = vec![tier(0.0, 1000.0, 5.0, true), tier(1000.0, 5000.0, 10.0, true)];
        let q = quote(&s, 2000.0, false);
        assert_eq!(q.bonus_amount, 200.0);
        assert_eq!(q.source, BonusSource::Tier);
        assert_eq!(q.applied_percent, 10.0);
    }

    #[test]
    fn test_shared_boundary_picks_first_tier() {
        let mut s = regular(0.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        s.tiers = vec![tier(0.0, 1000.0, 5.0, true), tier(1000.0, 5000.0, 10.0, true)];
        assert_eq!(compute_bonus(&s, 1000.0, false), 50.0);
    }

    #[test]
    fn test_inactive_tier_skipped() {
        let mut s = regular(0.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        s.tiers = vec![tier(0.0, 1000.0, 20.0, false), tier(0.0, 1000.0, 5.0, true)];
        assert_eq!(compute_bonus(&s, 100.0, false), 5.0);

        s.tiers[1].active = false;
        assert!(find_tier(&s.tiers, 100.0).is_none());
        assert_eq!(compute_bonus(&s, 100.0, false), 0.0);
    }

    #[test]
    fn test_no_matching_tier_does_not_fall_back_to_regular() {
        let mut s = regular(10.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        s.tiers = vec![tier(0.0, 100.0, 5.0, true)];
        let q = quote(&s, 500.0, false);
        assert_eq!(q.bonus_amount, 0.0);
        assert_eq!(q.source, BonusSource::Tier);
    }

    #[test]
    fn test_tier_mode_without_tiers_uses_regular() {
        let mut s = regular(10.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        let q = quote(&s, 500.0, false);
        assert_eq!(q.bonus_amount, 50.0);
        assert_eq!(q.source, BonusSource::Regular);
    }

    #[test]
    fn test_first_deposit_takes_precedence_over_tiers() {
        let mut s = regular(10.0, 0.0, 0.0);
        s.use_tier_bonus = true;
        s.tiers = vec![tier(0.0, 5000.0, 5.0, true)];
        s.first_deposit_bonus_enabled = true;
        s.first_deposit_bonus_percent = 50.0;

        let q = quote(&s, 1000.0, true);
        assert_eq!(q.bonus_amount, 500.0);
        assert_eq!(q.source, BonusSource::FirstDeposit);
        assert_eq!(compute_bonus(&s, 1000.0, false), 50.0);
    }

    #[test]
    fn test_first_deposit_flag_ignored_when_disabled() {
        let mut s = regular(10.0, 0.0, 0.0);
        s.first_deposit_bonus_percent = 50.0;
        assert_eq!(compute_bonus(&s, 100.0, true), 10.0);
    }

    #[test]
    fn test_rounds_to_cents() {
        let s = regular(3.333, 0.0, 0.0);
        let q = quote(&s, 123.45, false);
        // 123.45 * 3.333% = 4.1145885
        assert_eq!(q.bonus_amount, 4.11);
        assert!(is_cents(q.bonus_amount));

        let s = regular(12.5, 0.0, 0.0);
        // 0.1 * 12.5% = 0.0125
        assert_eq!(compute_bonus(&s, 0.1, false), 0.01);
        // 0.5 * 7% = 0.035, half rounds away from zero
        let s = regular(7.0, 0.0, 0.0);
        assert_eq!(compute_bonus(&s, 0.5, false), 0.04);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let s = regular(100.0, 0.0, 25.5);
        for amount in [0.0, 10.0, 25.5, 26.0, 1e9] {
            let bonus = compute_bonus(&s, amount, false);
            assert!(bonus <= 25.5, "{amount} -> {bonus}");
            assert!(is_cents(bonus));
        }
    }

    #[test]
    fn test_zero_percent_zero_bonus() {
        let s = regular(0.0, 0.0, 0.0);
        let q = quote(&s, 100.0, false);
        assert_eq!(q.bonus_amount, 0.0);
        assert_eq!(q.total_credit, 100.0);
    }
}
