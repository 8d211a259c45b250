//! Configuration structures for the sync engine.
//!
//! Strongly typed structs with sensible defaults so the rest of the crate
//! can depend on a stable configuration shape irrespective of how the data
//! is loaded (embedded defaults, deserialized files, tests, etc.).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants;

/// Top-level configuration block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Remote API tuning (endpoints, station, timeouts, UA).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_guide_base_url")]
    pub guide_base_url: String,
    #[serde(default = "ApiConfig::default_station")]
    pub station: String,
    #[serde(default = "ApiConfig::default_timezone")]
    pub timezone: String,
    #[serde(default = "ApiConfig::default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "ApiConfig::default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "https://music.abcradio.net.au/api/v1".to_string()
    }

    fn default_guide_base_url() -> String {
        "https://program.abcradio.net.au/api/v1".to_string()
    }

    fn default_station() -> String {
        "triplej".to_string()
    }

    fn default_timezone() -> String {
        "Australia/Sydney".to_string()
    }

    const fn default_timeout() -> u64 {
        30
    }

    fn default_user_agent() -> String {
        "triplej-sync/1.0".to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            guide_base_url: Self::default_guide_base_url(),
            station: Self::default_station(),
            timezone: Self::default_timezone(),
            timeout_seconds: Self::default_timeout(),
            user_agent: Self::default_user_agent(),
        }
    }
}

/// Polling strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "PollingConfig::default_fallback")]
    pub fallback_seconds: u64,
    #[serde(default = "PollingConfig::default_search")]
    pub search_seconds: u64,
    #[serde(default = "PollingConfig::default_guide")]
    pub guide_seconds: u64,
}

impl PollingConfig {
    const fn default_fallback() -> u64 {
        constants::FALLBACK_POLL_SECONDS
    }

    const fn default_search() -> u64 {
        constants::SEARCH_POLL_SECONDS
    }

    const fn default_guide() -> u64 {
        constants::PROGRAM_GUIDE_POLL_SECONDS
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_seconds)
    }

    pub fn search_interval(&self) -> Duration {
        Duration::from_secs(self.search_seconds)
    }

    pub fn guide_interval(&self) -> Duration {
        Duration::from_secs(self.guide_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            fallback_seconds: Self::default_fallback(),
            search_seconds: Self::default_search(),
            guide_seconds: Self::default_guide(),
        }
    }
}

/// Persisted history tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_database_path")]
    pub database_path: String,
    #[serde(default = "HistoryConfig::default_max_age_days")]
    pub max_age_days: i64,
    #[serde(default = "HistoryConfig::default_recent_limit")]
    pub recent_limit: usize,
}

impl HistoryConfig {
    fn default_database_path() -> String {
        "triplej_history.db".to_string()
    }

    const fn default_max_age_days() -> i64 {
        constants::HISTORY_DEFAULT_MAX_AGE_DAYS
    }

    const fn default_recent_limit() -> usize {
        constants::RECENT_TRACKS_LIMIT
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_path: Self::default_database_path(),
            max_age_days: Self::default_max_age_days(),
            recent_limit: Self::default_recent_limit(),
        }
    }
}
