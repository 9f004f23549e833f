//! Snapshot and identity-mapping files.
//!
//! Both files are written to a sibling temp file first and then renamed over
//! the destination, so a reader never sees a half-written file and a crash
//! mid-write leaves the previous version intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use super::IdentityMapping;
use crate::domain::{MatchRecord, Snapshot};

/// Display format of the `updated` field.
const UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk layout of the snapshot file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
}

/// On-disk layout of the identity mapping file.
#[derive(Debug, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub mapping: IdentityMapping,
}

/// Whatever could be recovered at startup.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub snapshot: Option<Snapshot>,
    pub mapping: IdentityMapping,
}

/// Reads and writes the two state files in one data directory.
#[derive(Debug, Clone)]
pub struct Persistence {
    snapshot_path: PathBuf,
    mapping_path: PathBuf,
}

impl Persistence {
    pub fn new(data_dir: impl AsRef<Path>, snapshot_file: &str, mapping_file: &str) -> Self {
        let dir = data_dir.as_ref();
        Self {
            snapshot_path: dir.join(snapshot_file),
            mapping_path: dir.join(mapping_file),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn mapping_path(&self) -> &Path {
        &self.mapping_path
    }

    /// Write the snapshot file, then the mapping file.
    pub fn save(
        &self,
        snapshot: &Snapshot,
        mapping: &IdentityMapping,
    ) -> Result<(), PersistenceError> {
        let now = Utc::now();

        let snapshot_file = SnapshotFileRef {
            timestamp: snapshot.captured_at,
            updated: snapshot.captured_at.format(UPDATED_FORMAT).to_string(),
            matches: &snapshot.matches,
        };
        let json = serde_json::to_vec(&snapshot_file)
            .map_err(|e| PersistenceError::json(&self.snapshot_path, e))?;
        write_atomic(&self.snapshot_path, &json)?;

        let mapping_file = MappingFileRef {
            updated: now.to_rfc3339(),
            mapping,
        };
        let json = serde_json::to_vec(&mapping_file)
            .map_err(|e| PersistenceError::json(&self.mapping_path, e))?;
        write_atomic(&self.mapping_path, &json)?;

        debug!(
            matches = snapshot.len(),
            mappings = mapping.len(),
            path = %self.snapshot_path.display(),
            "State files saved"
        );
        Ok(())
    }

    /// Load both files. Absent files yield empty state; corrupt ones are
    /// logged and ignored.
    pub fn load(&self) -> LoadedState {
        let snapshot = match self.read_snapshot() {
            Ok(Some(file)) => {
                info!(
                    matches = file.matches.len(),
                    path = %self.snapshot_path.display(),
                    "Loaded existing snapshot"
                );
                Some(Snapshot::new(file.timestamp, file.matches))
            }
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Ignoring unreadable snapshot file");
                None
            }
        };

        let mapping = match self.read_mapping() {
            Ok(Some(file)) => {
                info!(entries = file.mapping.len(), "Loaded identity mapping");
                file.mapping
            }
            Ok(None) => IdentityMapping::new(),
            Err(e) => {
                error!(error = %e, "Ignoring unreadable identity mapping file");
                IdentityMapping::new()
            }
        };

        LoadedState { snapshot, mapping }
    }

    /// Strict read of the snapshot file; `Ok(None)` when it does not exist.
    pub fn read_snapshot(&self) -> Result<Option<SnapshotFile>, PersistenceError> {
        read_json(&self.snapshot_path)
    }

    /// Strict read of the mapping file; `Ok(None)` when it does not exist.
    pub fn read_mapping(&self) -> Result<Option<MappingFile>, PersistenceError> {
        read_json(&self.mapping_path)
    }
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    timestamp: DateTime<Utc>,
    updated: String,
    matches: &'a [MatchRecord],
}

#[derive(Serialize)]
struct MappingFileRef<'a> {
    updated: String,
    mapping: &'a IdentityMapping,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| PersistenceError::json(path, e))
}

/// Write to `<path>.tmp` in the same directory, fsync, rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let cleanup_and_err = |e| {
        let _ = fs::remove_file(&temp_path);
        PersistenceError::io(path, e)
    };

    let mut file = fs::File::create(&temp_path).map_err(|e| PersistenceError::io(&temp_path, e))?;
    file.write_all(bytes).map_err(cleanup_and_err)?;
    file.sync_all().map_err(cleanup_and_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(cleanup_and_err)?;
    Ok(())
}

/// Throttle for disk writes.
///
/// Persist when nothing has been written yet, when `min_interval` has elapsed
/// since the last write, or when more than `burst_threshold` matches were
/// touched in the current cycle. After a failed write the next attempt waits
/// a full `min_interval`, bursts included.
#[derive(Debug, Clone)]
pub struct PersistPolicy {
    min_interval: Duration,
    burst_threshold: usize,
    last_persist: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

impl PersistPolicy {
    pub fn new(min_interval: std::time::Duration, burst_threshold: usize) -> Self {
        Self {
            min_interval: Duration::from_std(min_interval).unwrap_or_else(|_| Duration::weeks(52)),
            burst_threshold,
            last_persist: None,
            last_failure: None,
        }
    }

    pub fn should_persist(&self, now: DateTime<Utc>, touched: usize) -> bool {
        if let Some(failed) = self.last_failure {
            return now.signed_duration_since(failed) >= self.min_interval;
        }
        if touched > self.burst_threshold {
            return true;
        }
        match self.last_persist {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.min_interval,
        }
    }

    pub fn mark_persisted(&mut self, now: DateTime<Utc>) {
        self.last_persist = Some(now);
        self.last_failure = None;
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.last_failure = Some(now);
    }

    pub fn last_persist(&self) -> Option<DateTime<Utc>> {
        self.last_persist
    }
}

impl Default for PersistPolicy {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(60), 5)
    }
}

/// Log a failed save without interrupting the caller.
pub(crate) fn report_save_failure(err: &PersistenceError) {
    error!(error = %err, "Failed to persist state; in-memory snapshot stays authoritative");
}
