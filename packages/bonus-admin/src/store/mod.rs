//! Persistence seam for settings, user balances and the transaction log.
//!
//! Handlers only talk to these traits. [`MemoryStore`] implements all of
//! them, optionally backed by a JSON snapshot on disk.

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotFile};

use crate::Error;
use bonus_engine::{BonusQuote, BonusSettings, BonusTransaction, UserBonusState};

/// Holder of the single settings record.
pub trait SettingsStore: Send + Sync {
    /// The settings record, created with defaults if none exists yet.
    fn get_or_create_default(&self) -> Result<BonusSettings, Error>;

    /// The settings record if one exists. Never creates it.
    fn current_settings(&self) -> Result<Option<BonusSettings>, Error>;

    /// Replace the settings record. Last write wins.
    fn save_settings(&self, settings: &BonusSettings) -> Result<(), Error>;
}

/// 1-based page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug)]
pub struct BalanceAdjustment<'a> {
    pub user_id: &'a str,
    pub delta: f64,
    pub actor: &'a str,
    pub reason: Option<&'a str>,
}

#[derive(Debug)]
pub struct DepositCredit<'a> {
    pub user_id: &'a str,
    pub username: Option<&'a str>,
    pub amount: f64,
    /// `None` derives the flag from the user's deposit history.
    pub is_first_deposit: Option<bool>,
    pub actor: &'a str,
}

#[derive(Debug)]
pub struct DepositReceipt {
    pub user: UserBonusState,
    pub transaction: BonusTransaction,
    pub quote: BonusQuote,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerTotals {
    pub total_bonus_given: f64,
    pub users_with_balance: u64,
}

/// Per-user bonus balances.
pub trait UserLedger: Send + Sync {
    fn user(&self, user_id: &str) -> Result<Option<UserBonusState>, Error>;

    /// Users that ever received a bonus, highest current balance first.
    fn bonus_recipients(&self, page: PageRequest) -> Result<Page<UserBonusState>, Error>;

    fn totals(&self) -> Result<LedgerTotals, Error>;

    /// Apply a manual adjustment and record it. The balance change and its
    /// audit entry commit together; concurrent adjustments are serialized.
    fn adjust_balance(
        &self,
        adjustment: &BalanceAdjustment<'_>,
    ) -> Result<(UserBonusState, BonusTransaction), Error>;

    /// Record a completed deposit and credit the bonus computed from `settings`.
    fn credit_deposit(
        &self,
        deposit: &DepositCredit<'_>,
        settings: &BonusSettings,
    ) -> Result<DepositReceipt, Error>;
}

/// Read side of the append-only transaction log.
pub trait TransactionLog: Send + Sync {
    /// Newest first.
    fn transactions_for(&self, user_id: &str, limit: usize)
        -> Result<Vec<BonusTransaction>, Error>;

    /// Completed deposits that carried a bonus.
    fn deposits_with_bonus(&self) -> Result<u64, Error>;
}

/// Everything the service needs from persistence.
pub trait Store: SettingsStore + UserLedger + TransactionLog {
    /// Write any buffered state to durable storage.
    fn flush(&self) -> Result<(), Error>;

    fn is_persistent(&self) -> bool;
}
