//! In-process store, optionally mirrored to a JSON snapshot.

use super::{
    BalanceAdjustment, DepositCredit, DepositReceipt, LedgerTotals, Page, PageRequest,
    SettingsStore, Snapshot, SnapshotFile, Store, TransactionLog, UserLedger,
};
use crate::Error;
use bonus_engine::{
    round_cents, BonusError, BonusSettings, BonusTransaction, UserBonusState,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

#[derive(Default)]
struct Ledger {
    users: HashMap<String, UserBonusState>,
    transactions: Vec<BonusTransaction>,
}

pub struct MemoryStore {
    /// `None` until first access; never more than one record.
    settings: RwLock<Option<BonusSettings>>,
    /// Users and transactions share a lock so a balance change and its audit
    /// entry are never observed apart.
    ledger: Mutex<Ledger>,
    snapshot: Option<SnapshotFile>,
    /// Serializes snapshot writes so an older state never overwrites a newer one.
    persist_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Memory-only store.
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(None),
            ledger: Mutex::new(Ledger::default()),
            snapshot: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Store mirrored to `path`, seeded from it if the file exists.
    pub fn open(path: PathBuf) -> Result<Self, Error> {
        let file = SnapshotFile::new(path);
        let Snapshot {
            settings,
            users,
            transactions,
        } = file.load()?;

        let users: HashMap<String, UserBonusState> = users
            .into_iter()
            .map(|u| (u.user_id.clone(), u))
            .collect();

        info!(
            path = %file.path().display(),
            users = users.len(),
            has_settings = settings.is_some(),
            "Store opened"
        );

        Ok(Self {
            settings: RwLock::new(settings),
            ledger: Mutex::new(Ledger {
                users,
                transactions,
            }),
            snapshot: Some(file),
            persist_lock: Mutex::new(()),
        })
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Held across a mutation and its snapshot write when the store is
    /// persistent. Always taken before the ledger lock.
    fn lock_persist(&self) -> Option<MutexGuard<'_, ()>> {
        self.snapshot
            .as_ref()
            .map(|_| self.persist_lock.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn read_settings(&self) -> Option<BonusSettings> {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Caller holds the persist lock.
    fn write_snapshot(&self, ledger: &Ledger) -> Result<(), Error> {
        let Some(file) = &self.snapshot else {
            return Ok(());
        };
        let mut users: Vec<UserBonusState> = ledger.users.values().cloned().collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        file.save(&Snapshot {
            settings: self.read_settings(),
            users,
            transactions: ledger.transactions.clone(),
        })
    }

    fn persist(&self) -> Result<(), Error> {
        let _persist = self.lock_persist();
        let ledger = self.lock_ledger();
        self.write_snapshot(&ledger)
    }

    /// Run `apply` against the ledger and write the snapshot. If either step
    /// fails, `user_id`'s record and the transaction log are restored, so a
    /// failed request leaves nothing behind.
    fn commit_ledger<T>(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut Ledger) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let _persist = self.lock_persist();
        let mut ledger = self.lock_ledger();
        let prior_user = ledger.users.get(user_id).cloned();
        let prior_len = ledger.transactions.len();

        let result = match apply(&mut *ledger) {
            Ok(value) => self.write_snapshot(&ledger).map(|()| value),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            ledger.transactions.truncate(prior_len);
            match prior_user {
                Some(user) => {
                    ledger.users.insert(user_id.to_string(), user);
                }
                None => {
                    ledger.users.remove(user_id);
                }
            }
            if matches!(e, Error::Store(_)) {
                warn!(user_id, error = %e, "Snapshot failed, ledger change rolled back");
            }
        }
        result
    }
}

impl SettingsStore for MemoryStore {
    fn get_or_create_default(&self) -> Result<BonusSettings, Error> {
        if let Some(settings) = self.read_settings() {
            return Ok(settings);
        }

        let created = {
            let mut slot = self.settings.write().unwrap_or_else(|e| e.into_inner());
            // Another request may have created it between the two locks.
            match slot.as_ref() {
                Some(existing) => return Ok(existing.clone()),
                None => slot.insert(BonusSettings::new_default(Utc::now())).clone(),
            }
        };
        info!("Created default bonus settings");
        self.persist()?;
        Ok(created)
    }

    fn current_settings(&self) -> Result<Option<BonusSettings>, Error> {
        Ok(self.read_settings())
    }

    fn save_settings(&self, settings: &BonusSettings) -> Result<(), Error> {
        let _persist = self.lock_persist();
        let previous = self
            .settings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(settings.clone());

        let ledger = self.lock_ledger();
        if let Err(e) = self.write_snapshot(&ledger) {
            *self.settings.write().unwrap_or_else(|e| e.into_inner()) = previous;
            warn!(error = %e, "Snapshot failed, settings change rolled back");
            return Err(e);
        }
        Ok(())
    }
}

impl UserLedger for MemoryStore {
    fn user(&self, user_id: &str) -> Result<Option<UserBonusState>, Error> {
        Ok(self.lock_ledger().users.get(user_id).cloned())
    }

    fn bonus_recipients(&self, page: PageRequest) -> Result<Page<UserBonusState>, Error> {
        let mut recipients: Vec<UserBonusState> = self
            .lock_ledger()
            .users
            .values()
            .filter(|u| u.has_received_bonus())
            .cloned()
            .collect();

        recipients.sort_by(|a, b| {
            b.bonus_balance
                .total_cmp(&a.bonus_balance)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let total = recipients.len();
        let items = recipients
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();
        Ok(Page { items, total })
    }

    fn totals(&self) -> Result<LedgerTotals, Error> {
        let ledger = self.lock_ledger();
        let total: f64 = ledger.users.values().map(|u| u.total_bonus_received).sum();
        let with_balance = ledger
            .users
            .values()
            .filter(|u| u.bonus_balance > 0.0)
            .count() as u64;
        Ok(LedgerTotals {
            total_bonus_given: round_cents(total),
            users_with_balance: with_balance,
        })
    }

    fn adjust_balance(
        &self,
        adjustment: &BalanceAdjustment<'_>,
    ) -> Result<(UserBonusState, BonusTransaction), Error> {
        let now = Utc::now();
        self.commit_ledger(adjustment.user_id, |ledger| {
            let user = ledger
                .users
                .get_mut(adjustment.user_id)
                .ok_or_else(|| BonusError::NotFound(format!("user {}", adjustment.user_id)))?;

            let applied = user.adjust(adjustment.delta, now)?;
            let user = user.clone();
            let transaction = BonusTransaction::adjustment(
                &user,
                applied,
                adjustment.actor,
                adjustment.reason,
                now,
            );
            ledger.transactions.push(transaction.clone());
            Ok((user, transaction))
        })
    }

    fn credit_deposit(
        &self,
        deposit: &DepositCredit<'_>,
        settings: &BonusSettings,
    ) -> Result<DepositReceipt, Error> {
        bonus_engine::check_deposit_amount(deposit.amount)?;

        let now = Utc::now();
        self.commit_ledger(deposit.user_id, |ledger| {
            let is_first = deposit.is_first_deposit.unwrap_or_else(|| {
                !ledger
                    .transactions
                    .iter()
                    .any(|t| t.user_id == deposit.user_id && t.is_completed_deposit())
            });
            let quote = bonus_engine::quote(settings, deposit.amount, is_first);

            let user = ledger
                .users
                .entry(deposit.user_id.to_string())
                .or_insert_with(|| UserBonusState::new(deposit.user_id, now));
            if let Some(name) = deposit.username {
                user.username = Some(name.to_string());
            }
            user.credit(quote.bonus_amount, now);
            let user = user.clone();

            let transaction = BonusTransaction::deposit(
                &user,
                deposit.amount,
                quote.bonus_amount,
                deposit.actor,
                now,
            );
            ledger.transactions.push(transaction.clone());
            Ok(DepositReceipt {
                user,
                transaction,
                quote,
            })
        })
    }
}

impl TransactionLog for MemoryStore {
    fn transactions_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BonusTransaction>, Error> {
        Ok(self
            .lock_ledger()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn deposits_with_bonus(&self) -> Result<u64, Error> {
        Ok(self
            .lock_ledger()
            .transactions
            .iter()
            .filter(|t| t.is_bonus_deposit())
            .count() as u64)
    }
}

impl Store for MemoryStore {
    fn flush(&self) -> Result<(), Error> {
        self.persist()
    }

    fn is_persistent(&self) -> bool {
        self.snapshot.is_some()
    }
}
