//! Application state shared across handlers.

use crate::config::Config;
use crate::store::{MemoryStore, Store};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        let store: Arc<dyn Store> = match &config.data_path {
            Some(path) if !path.is_empty() => Arc::new(MemoryStore::open(path.into())?),
            _ => {
                info!("No data_path configured, state is memory-only");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(config, store))
    }

    /// Create application state over an existing store.
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            store,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }
}
