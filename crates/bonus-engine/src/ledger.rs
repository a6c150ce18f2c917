//! Per-user bonus balance rules and the audit records they produce.

use crate::calculator::round_cents;
use crate::error::{BonusError, MAX_AMOUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ADJUST_REASON: &str = "Manual bonus adjustment by admin";

/// Bonus-related fields of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBonusState {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Spendable bonus. Never negative.
    pub bonus_balance: f64,
    /// Lifetime credited bonus. Only grows.
    pub total_bonus_received: f64,
    pub updated_at: DateTime<Utc>,
}

impl UserBonusState {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            bonus_balance: 0.0,
            total_bonus_received: 0.0,
            updated_at: now,
        }
    }

    /// Apply a signed manual adjustment, rounded to cents first. Returns the
    /// delta actually applied. On error nothing changes.
    pub fn adjust(&mut self, delta: f64, now: DateTime<Utc>) -> Result<f64, BonusError> {
        if !delta.is_finite() || delta == 0.0 {
            return Err(BonusError::field("amount", "must be a non-zero number"));
        }
        if delta.abs() > MAX_AMOUNT {
            return Err(BonusError::field("amount", "must not exceed 1000000000000"));
        }
        let delta = round_cents(delta);
        if delta == 0.0 {
            return Err(BonusError::field("amount", "must be at least 0.01 in magnitude"));
        }
        if self.bonus_balance + delta < 0.0 {
            return Err(BonusError::NegativeBalance {
                balance: self.bonus_balance,
                delta,
            });
        }

        self.bonus_balance = round_cents(self.bonus_balance + delta).max(0.0);
        if delta > 0.0 {
            self.total_bonus_received = round_cents(self.total_bonus_received + delta);
        }
        self.updated_at = now;
        Ok(delta)
    }

    /// Credit a computed deposit bonus. Zero is a no-op apart from the timestamp.
    pub fn credit(&mut self, bonus: f64, now: DateTime<Utc>) -> f64 {
        if bonus > 0.0 {
            self.bonus_balance = round_cents(self.bonus_balance + bonus);
            self.total_bonus_received = round_cents(self.total_bonus_received + bonus);
        }
        self.updated_at = now;
        self.bonus_balance
    }

    pub fn has_received_bonus(&self) -> bool {
        self.total_bonus_received > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Deposit,
    BonusAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    /// Written once the balance change has been applied.
    Completed,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// Deposit amount, or the signed delta for adjustments.
    pub amount: f64,
    pub bonus_amount: f64,
    pub bonus_balance_after: f64,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BonusTransaction {
    pub fn adjustment(
        user: &UserBonusState,
        delta: f64,
        actor: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ADJUST_REASON);
        Self {
            id: Uuid::new_v4(),
            user_id: user.user_id.clone(),
            kind: TransactionKind::BonusAdjustment,
            status: TransactionStatus::Completed,
            amount: delta,
            bonus_amount: delta,
            bonus_balance_after: user.bonus_balance,
            actor: Some(actor.to_string()),
            reason: Some(reason.to_string()),
            created_at: now,
        }
    }

    pub fn deposit(
        user: &UserBonusState,
        amount: f64,
        bonus: f64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.user_id.clone(),
            kind: TransactionKind::Deposit,
            status: TransactionStatus::Completed,
            amount,
            bonus_amount: bonus,
            bonus_balance_after: user.bonus_balance,
            actor: Some(actor.to_string()),
            reason: None,
            created_at: now,
        }
    }

    pub fn is_completed_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit && self.status == TransactionStatus::Completed
    }

    /// Completed deposit that credited a bonus.
    pub fn is_bonus_deposit(&self) -> bool {
        self.is_completed_deposit() && self.bonus_amount > 0.0
    }
}
