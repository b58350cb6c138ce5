//! Runtime configuration, read from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DATA_DIR_ENV: &str = "WALLET_LEDGER_DATA_DIR";
pub const STORE_TIMEOUT_ENV: &str = "WALLET_LEDGER_STORE_TIMEOUT_MS";
pub const LOG_ENV: &str = "WALLET_LEDGER_LOG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding one JSON file per store namespace
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Upper bound for a single store load or save
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("wallet-data")
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_timeout_ms: default_store_timeout_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Builds the config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup(DATA_DIR_ENV)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            store_timeout_ms: lookup(STORE_TIMEOUT_ENV)
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.store_timeout_ms),
            log_level: lookup(LOG_ENV)
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
