//! Authoritative in-memory match state.
//!
//! The current snapshot, the identity mapping and every per-match history
//! log live behind one mutex. Writers hand a fully built snapshot to
//! [`SnapshotStore::replace`]; readers get an `Arc` to whichever snapshot was
//! current when they asked, so nobody ever iterates a half-built match list.

mod history;
mod mapping;
pub mod persistence;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::domain::{ChangeHistoryEntry, MatchId, MatchRecord, Snapshot};

pub use history::HistoryLog;
pub use mapping::IdentityMapping;
pub use persistence::{LoadedState, PersistPolicy, Persistence};

/// Default number of history entries kept per match.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Result of looking a match up by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The id is current.
    Found(MatchRecord),
    /// The id was superseded; `resolved_id` is the canonical one.
    Moved {
        record: MatchRecord,
        resolved_id: MatchId,
    },
    NotFound,
}

impl Lookup {
    pub fn record(&self) -> Option<&MatchRecord> {
        match self {
            Self::Found(record) | Self::Moved { record, .. } => Some(record),
            Self::NotFound => None,
        }
    }

    pub fn resolved_id(&self) -> Option<&MatchId> {
        match self {
            Self::Moved { resolved_id, .. } => Some(resolved_id),
            _ => None,
        }
    }
}

/// Lightweight view for health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub matches_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub changes_since_last_update: usize,
}

/// A history entry tagged with the match it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedChange {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub entry: ChangeHistoryEntry,
}

struct StoreState {
    snapshot: Arc<Snapshot>,
    mapping: IdentityMapping,
    history: HashMap<MatchId, HistoryLog>,
    last_updated: Option<DateTime<Utc>>,
    changes_since_last_update: usize,
}

/// Shared match state with a single coarse lock.
pub struct SnapshotStore {
    state: Mutex<StoreState>,
    history_limit: usize,
}

impl SnapshotStore {
    /// Empty store.
    pub fn new(history_limit: usize) -> Self {
        Self::with_state(Snapshot::empty(Utc::now()), IdentityMapping::new(), history_limit)
            .never_updated()
    }

    /// Store pre-populated from a persisted snapshot and mapping.
    pub fn with_state(snapshot: Snapshot, mapping: IdentityMapping, history_limit: usize) -> Self {
        let last_updated = Some(snapshot.captured_at);
        Self {
            state: Mutex::new(StoreState {
                snapshot: Arc::new(snapshot),
                mapping,
                history: HashMap::new(),
                last_updated,
                changes_since_last_update: 0,
            }),
            history_limit,
        }
    }

    /// Seed from whatever the cold-start load recovered.
    pub fn from_loaded(loaded: LoadedState, history_limit: usize) -> Self {
        match loaded.snapshot {
            Some(snapshot) => Self::with_state(snapshot, loaded.mapping, history_limit),
            None => {
                let store = Self::new(history_limit);
                store.state.lock().mapping = loaded.mapping;
                store
            }
        }
    }

    fn never_updated(self) -> Self {
        self.state.lock().last_updated = None;
        self
    }

    /// Current snapshot; safe to hold and iterate after the call returns.
    pub fn read_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.lock().snapshot)
    }

    /// Snapshot and mapping taken in the same critical section.
    pub fn persistable(&self) -> (Arc<Snapshot>, IdentityMapping) {
        let state = self.state.lock();
        (Arc::clone(&state.snapshot), state.mapping.clone())
    }

    pub fn mapping(&self) -> IdentityMapping {
        self.state.lock().mapping.clone()
    }

    /// Swap in a new snapshot together with its mapping and history additions.
    pub fn replace(
        &self,
        snapshot: Snapshot,
        mapping_entries: Vec<(MatchId, MatchId)>,
        history_entries: Vec<(MatchId, ChangeHistoryEntry)>,
    ) {
        let captured_at = snapshot.captured_at;
        let changes = history_entries.len();
        let snapshot = Arc::new(snapshot);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        for (legacy, current) in mapping_entries {
            match state.mapping.resolve(&legacy) {
                Some(existing) if *existing == current => {}
                Some(existing) => warn!(
                    legacy = %legacy,
                    current = %current,
                    existing = %existing,
                    "Identity mapping entry already present; keeping existing"
                ),
                None => {
                    state.mapping.insert(legacy, current);
                }
            }
        }
        // History follows the snapshot: logs of matches no longer present go.
        {
            let live: HashSet<&MatchId> = snapshot
                .matches
                .iter()
                .map(|m| &m.id)
                .chain(history_entries.iter().map(|(id, _)| id))
                .collect();
            state.history.retain(|id, _| live.contains(id));
        }
        for (id, entry) in history_entries {
            state
                .history
                .entry(id)
                .or_insert_with(|| HistoryLog::new(self.history_limit))
                .push(entry);
        }
        state.snapshot = snapshot;
        state.last_updated = Some(captured_at);
        state.changes_since_last_update = changes;
    }

    /// Direct lookup, then one hop through the identity mapping.
    pub fn find_by_id(&self, id: &MatchId) -> Lookup {
        let (snapshot, resolved) = {
            let state = self.state.lock();
            (Arc::clone(&state.snapshot), state.mapping.resolve(id).cloned())
        };

        if let Some(record) = snapshot.get(id) {
            return Lookup::Found(record.clone());
        }

        match resolved.and_then(|rid| snapshot.get(&rid).map(|r| (r.clone(), rid))) {
            Some((record, resolved_id)) => Lookup::Moved {
                record,
                resolved_id,
            },
            None => Lookup::NotFound,
        }
    }

    /// Change history for `id`, oldest first, following the mapping once.
    pub fn history(&self, id: &MatchId) -> Vec<ChangeHistoryEntry> {
        let state = self.state.lock();
        if let Some(log) = state.history.get(id) {
            return log.to_vec();
        }
        state
            .mapping
            .resolve(id)
            .and_then(|rid| state.history.get(rid))
            .map(HistoryLog::to_vec)
            .unwrap_or_default()
    }

    /// Newest changes across every match, newest first.
    pub fn recent_changes(&self, limit: usize) -> Vec<TaggedChange> {
        let state = self.state.lock();
        let mut changes: Vec<TaggedChange> = state
            .history
            .iter()
            .flat_map(|(id, log)| {
                log.iter().rev().take(limit).map(move |entry| TaggedChange {
                    match_id: id.clone(),
                    entry: *entry,
                })
            })
            .collect();
        drop(state);

        changes.sort_by(|a, b| {
            b.entry
                .timestamp
                .cmp(&a.entry.timestamp)
                .then_with(|| a.match_id.cmp(&b.match_id))
        });
        changes.truncate(limit);
        changes
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.state.lock();
        StoreStatus {
            matches_count: state.snapshot.len(),
            last_updated: state.last_updated,
            changes_since_last_update: state.changes_since_last_update,
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
