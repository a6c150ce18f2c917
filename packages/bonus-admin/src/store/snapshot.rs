//! JSON snapshot persistence for [`MemoryStore`](super::MemoryStore).

use crate::Error;
use bonus_engine::{BonusSettings, BonusTransaction, UserBonusState};
use std::path::{Path, PathBuf};
use tracing::info;

/// Full store contents as written to disk.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub settings: Option<BonusSettings>,
    #[serde(default)]
    pub users: Vec<UserBonusState>,
    #[serde(default)]
    pub transactions: Vec<BonusTransaction>,
}

pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| Error::Store(format!("Failed to serialize snapshot: {e}")))?;

        // Atomic write: tmp + rename
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("Failed to create snapshot directory: {e}"))
            })?;
        }
        std::fs::write(&tmp, &json)
            .map_err(|e| Error::Store(format!("Failed to write snapshot: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Store(format!("Failed to rename snapshot: {e}")))?;

        info!(
            path = %self.path.display(),
            users = snapshot.users.len(),
            transactions = snapshot.transactions.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Snapshot, Error> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No snapshot found, starting fresh");
            return Ok(Snapshot::default());
        }

        let data = std::fs::read(&self.path)
            .map_err(|e| Error::Store(format!("Failed to read snapshot: {e}")))?;
        let snapshot: Snapshot = serde_json::from_slice(&data)
            .map_err(|e| Error::Store(format!("Failed to parse snapshot: {e}")))?;

        info!(
            path = %self.path.display(),
            users = snapshot.users.len(),
            transactions = snapshot.transactions.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}
