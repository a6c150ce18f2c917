//! Service configuration.

use bonus_engine::TierPolicy;
use serde::Deserialize;

/// Configuration for the bonus admin service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// JSON snapshot file. Unset keeps everything in memory.
    #[serde(default)]
    pub data_path: Option<String>,

    /// Admin API key. Unset disables auth (dev mode).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::default_page_limit")]
    pub default_page_limit: usize,

    #[serde(default = "defaults::max_page_limit")]
    pub max_page_limit: usize,

    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Re-check tier range and overlap on edits, not just on insert.
    #[serde(default)]
    pub revalidate_tier_updates: bool,

    #[serde(default = "defaults::default_adjust_reason")]
    pub default_adjust_reason: String,
}

impl Config {
    pub fn tier_policy(&self) -> TierPolicy {
        TierPolicy {
            revalidate_on_update: self.revalidate_tier_updates,
        }
    }

    /// API key, treating an empty string as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            data_path: None,
            api_key: None,
            default_page_limit: defaults::default_page_limit(),
            max_page_limit: defaults::max_page_limit(),
            request_timeout_secs: defaults::request_timeout_secs(),
            revalidate_tier_updates: false,
            default_adjust_reason: defaults::default_adjust_reason(),
        }
    }
}

mod defaults {
    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn default_page_limit() -> usize {
        20
    }

    pub fn max_page_limit() -> usize {
        100
    }

    pub fn request_timeout_secs() -> u64 {
        15
    }

    pub fn default_adjust_reason() -> String {
        bonus_engine::DEFAULT_ADJUST_REASON.into()
    }
}
