//! Deposit bonus rules: settings, tier admission, bonus calculation and
//! manual balance adjustment.
//! No HTTP or storage dependency: every function here is pure over the
//! values passed in.

mod calculator;
mod error;
mod ledger;
mod settings;
mod tiers;

pub use calculator::{compute_bonus, find_tier, quote, round_cents, BonusQuote, BonusSource};
pub use error::{check_deposit_amount, BonusError, FieldError, MAX_AMOUNT};
pub use ledger::{
    BonusTransaction, TransactionKind, TransactionStatus, UserBonusState, DEFAULT_ADJUST_REASON,
};
pub use settings::{BonusSettings, BonusTier, SettingsPatch};
pub use tiers::{add_tier, remove_tier, update_tier, NewTier, TierPatch, TierPolicy, TierRef};
