//! Poller, storage and server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::{PersistPolicy, Persistence, DEFAULT_HISTORY_LIMIT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Milliseconds between scrape cycles.
    pub interval_ms: u64,
    /// Consecutive failures after which absent matches are retained.
    pub recovery_threshold: u32,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            recovery_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub snapshot_file: String,
    pub mapping_file: String,
    pub min_persist_interval_secs: u64,
    /// Persist immediately when more matches than this change in one cycle.
    pub burst_threshold: usize,
    /// History entries kept per match.
    pub history_limit: usize,
}

impl StorageConfig {
    pub fn persistence(&self) -> Persistence {
        Persistence::new(&self.data_dir, &self.snapshot_file, &self.mapping_file)
    }

    pub fn persist_policy(&self) -> PersistPolicy {
        PersistPolicy::new(
            Duration::from_secs(self.min_persist_interval_secs),
            self.burst_threshold,
        )
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_file: "odds_latest.json".into(),
            mapping_file: "match_id_mapping.json".into(),
            min_persist_interval_secs: 60,
            burst_threshold: 5,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
        }
    }
}
