//! Reconciliation of freshly scraped batches against the current snapshot.
//!
//! One `ingest` call is one cycle: key every incoming record by its team
//! pairing, match it to an existing record by id or by key, classify what
//! changed, assemble the next snapshot and hand it to the store in a single
//! `replace`. Persistence runs after the store lock has been released.

pub mod clock;
pub mod health;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::domain::{classify, is_equal, ChangeHistoryEntry, MatchId, MatchRecord, Snapshot, StableKey};
use crate::store::persistence::report_save_failure;
use crate::store::{PersistPolicy, Persistence, SnapshotStore};

pub use clock::{Clock, ManualClock, SystemClock};
pub use health::{Phase, ScrapeHealth};

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New plus updated matches.
    pub matches_touched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Absent from the batch and dropped.
    pub removed: usize,
    /// Absent from the batch but kept because the scraper is degraded.
    pub retained: usize,
    /// Later records in the batch that resolved to an id already processed.
    pub duplicates: usize,
    /// Identity mapping entries proposed this cycle.
    pub remapped: usize,
    pub persisted: bool,
}

enum Resolution<'a> {
    ById(&'a MatchRecord),
    ByKey(&'a MatchRecord),
    New,
}

pub struct ReconciliationEngine {
    store: Arc<SnapshotStore>,
    health: Arc<ScrapeHealth>,
    persistence: Option<Persistence>,
    // Held for the whole cycle, which also serialises concurrent ingests.
    policy: Mutex<PersistPolicy>,
    clock: Arc<dyn Clock>,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<SnapshotStore>, health: Arc<ScrapeHealth>) -> Self {
        Self {
            store,
            health,
            persistence: None,
            policy: Mutex::new(PersistPolicy::default()),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Persistence, policy: PersistPolicy) -> Self {
        self.persistence = Some(persistence);
        self.policy = Mutex::new(policy);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn health(&self) -> &Arc<ScrapeHealth> {
        &self.health
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Merge one scraped batch into the store.
    pub fn ingest(&self, batch: Vec<MatchRecord>) -> IngestReport {
        let mut policy = self.policy.lock();
        let now = self.clock.now();
        let current = self.store.read_snapshot();
        let mapping = self.store.mapping();
        let degraded = self.health.is_degraded();

        let by_id: HashMap<&MatchId, &MatchRecord> =
            current.matches.iter().map(|m| (&m.id, m)).collect();
        let mut by_key: HashMap<StableKey, &MatchRecord> = HashMap::new();
        for m in current.matches.iter().filter(|m| m.team1.is_some() || m.team2.is_some()) {
            by_key.entry(m.stable_key()).or_insert(m);
        }

        let mut report = IngestReport::default();
        let mut matches = Vec::with_capacity(batch.len().max(current.len()));
        let mut processed: HashSet<MatchId> = HashSet::with_capacity(batch.len());
        let mut mapping_entries = Vec::new();
        let mut history_entries = Vec::new();

        for mut record in batch {
            let key = record.stable_key();
            let candidate = key.to_match_id();

            let resolution = match by_id.get(&candidate) {
                Some(existing) => Resolution::ById(*existing),
                None => match by_key.get(&key) {
                    Some(existing) => Resolution::ByKey(*existing),
                    None => Resolution::New,
                },
            };

            let assigned = match &resolution {
                Resolution::ById(existing) | Resolution::ByKey(existing) => existing.id.clone(),
                Resolution::New => candidate.clone(),
            };
            if !processed.insert(assigned.clone()) {
                debug!(id = %assigned, "Duplicate match in batch; keeping first occurrence");
                report.duplicates += 1;
                continue;
            }

            match resolution {
                Resolution::ById(existing) | Resolution::ByKey(existing) => {
                    if existing.id != candidate && mapping.resolve(&existing.id).is_none() {
                        debug!(legacy = %existing.id, current = %candidate, "Match re-keyed by team pairing");
                        mapping_entries.push((existing.id.clone(), candidate.clone()));
                        report.remapped += 1;
                    }

                    if is_equal(existing, &record) {
                        matches.push(existing.clone());
                        report.unchanged += 1;
                    } else {
                        let changes = classify(existing, &record);
                        record.id = existing.id.clone();
                        history_entries.push((record.id.clone(), changes.to_entry(now)));
                        matches.push(record);
                        report.updated += 1;
                    }
                }
                Resolution::New => {
                    record.id = candidate;
                    history_entries.push((record.id.clone(), ChangeHistoryEntry::first_seen(now)));
                    matches.push(record);
                    report.new += 1;
                }
            }
        }

        for old in current.matches.iter().filter(|m| !processed.contains(&m.id)) {
            if degraded {
                matches.push(old.clone());
                report.retained += 1;
            } else {
                report.removed += 1;
            }
        }

        report.matches_touched = report.new + report.updated;
        let total = matches.len();
        drop(by_id);
        drop(by_key);

        self.store
            .replace(Snapshot::new(now, matches), mapping_entries, history_entries);

        if report.matches_touched > 0 || report.removed > 0 {
            info!(
                touched = report.matches_touched,
                new = report.new,
                updated = report.updated,
                removed = report.removed,
                retained = report.retained,
                matches = total,
                "Snapshot updated"
            );
        } else {
            debug!(matches = total, "No changes in batch");
        }

        if let Some(persistence) = &self.persistence {
            if policy.should_persist(now, report.matches_touched) {
                let (snapshot, mapping) = self.store.persistable();
                match persistence.save(&snapshot, &mapping) {
                    Ok(()) => {
                        policy.mark_persisted(now);
                        report.persisted = true;
                    }
                    Err(e) => {
                        policy.mark_failed(now);
                        report_save_failure(&e);
                    }
                }
            }
        }

        report
    }

    /// Unconditionally persist the current state, e.g. on shutdown.
    pub fn flush(&self) -> bool {
        let Some(persistence) = &self.persistence else {
            return false;
        };
        let mut policy = self.policy.lock();
        let (snapshot, mapping) = self.store.persistable();
        match persistence.save(&snapshot, &mapping) {
            Ok(()) => {
                policy.mark_persisted(self.clock.now());
                info!(matches = snapshot.len(), "State flushed to disk");
                true
            }
            Err(e) => {
                policy.mark_failed(self.clock.now());
                report_save_failure(&e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OddEntry, OddsLadder};
    use chrono::{DateTime, Duration, Utc};

    fn start() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn record(team1: &str, team2: &str, back: &str) -> MatchRecord {
        let mut r = MatchRecord::new(Some(team1.into()), Some(team2.into()), start());
        r.odds = OddsLadder::new(OddEntry::new(0, back, None).into_iter().collect(), vec![]);
        r
    }

    fn engine(threshold: u32) -> (ReconciliationEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::new(threshold)),
        )
        .with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn first_batch_creates_matches() {
        let (engine, _) = engine(10);
        let report = engine.ingest(vec![record("India", "Australia", "1.50")]);

        assert_eq!(report.matches_touched, 1);
        assert_eq!(report.new, 1);
        let id = MatchId::from("match_australia__vs__india");
        let history = engine.store().history(&id);
        assert_eq!(history, vec![ChangeHistoryEntry::first_seen(start())]);
    }

    #[test]
    fn swapped_teams_keep_identity() {
        let (engine, clock) = engine(10);
        engine.ingest(vec![record("India", "Australia", "1.50")]);
        clock.advance(Duration::seconds(1));
        let report = engine.ingest(vec![record("Australia", "India", "1.55")]);

        assert_eq!(report.updated, 1);
        let snapshot = engine.store().read_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.matches[0].id.as_str(), "match_australia__vs__india");
        assert_eq!(snapshot.matches[0].odds.back[0].price, "1.55");

        let history = engine.store().history(&snapshot.matches[0].id);
        assert_eq!(history.len(), 2);
        assert!(history[1].odds_changed);
        assert!(!history[1].score_changed);
        assert!(!history[1].status_changed);
    }

    #[test]
    fn identical_batch_is_a_no_op() {
        let (engine, clock) = engine(10);
        let batch = vec![record("India", "Australia", "1.50")];
        engine.ingest(batch.clone());
        let before = engine.store().read_snapshot();

        clock.advance(Duration::seconds(1));
        let report = engine.ingest(batch);

        assert_eq!(report.matches_touched, 0);
        assert_eq!(report.unchanged, 1);
        let after = engine.store().read_snapshot();
        assert_eq!(after.matches, before.matches);
        assert_eq!(engine.store().history(&after.matches[0].id).len(), 1);
    }

    #[test]
    fn absent_matches_are_dropped_when_healthy() {
        let (engine, _) = engine(3);
        engine.ingest(vec![record("A", "B", "1.50"), record("C", "D", "2.00")]);
        let report = engine.ingest(vec![record("A", "B", "1.50")]);

        assert_eq!(report.removed, 1);
        assert_eq!(engine.store().read_snapshot().len(), 1);
    }

    #[test]
    fn absent_matches_are_retained_when_degraded() {
        let (engine, _) = engine(3);
        engine.ingest(vec![record("A", "B", "1.50"), record("C", "D", "2.00")]);
        for _ in 0..3 {
            engine.health().record_failure();
        }
        let report = engine.ingest(vec![record("A", "B", "1.50")]);

        assert_eq!(report.retained, 1);
        assert_eq!(report.removed, 0);
        let snapshot = engine.store().read_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.matches[1].id.as_str(), "match_c__vs__d");
        assert_eq!(snapshot.matches[1].odds.back[0].price, "2.00");
    }

    #[test]
    fn legacy_id_is_preserved_and_mapped() {
        let store = Arc::new(SnapshotStore::default());
        let mut legacy = record("India", "Australia", "1.50");
        legacy.id = MatchId::from("match_1xbet_9912");
        store.replace(Snapshot::new(start(), vec![legacy]), vec![], vec![]);

        let engine = ReconciliationEngine::new(store.clone(), Arc::new(ScrapeHealth::default()))
            .with_clock(Arc::new(ManualClock::new(start())));
        let report = engine.ingest(vec![record("Australia", "India", "1.60")]);

        assert_eq!(report.remapped, 1);
        assert_eq!(report.updated, 1);
        let snapshot = store.read_snapshot();
        assert_eq!(snapshot.matches[0].id.as_str(), "match_1xbet_9912");
        assert_eq!(
            store.mapping().resolve(&"match_1xbet_9912".into()),
            Some(&MatchId::from("match_australia__vs__india"))
        );
    }

    #[test]
    fn known_legacy_id_is_not_remapped_again() {
        let store = Arc::new(SnapshotStore::default());
        let mut legacy = record("India", "Australia", "1.50");
        legacy.id = MatchId::from("match_1xbet_9912");
        store.replace(Snapshot::new(start(), vec![legacy]), vec![], vec![]);

        let clock = Arc::new(ManualClock::new(start()));
        let engine = ReconciliationEngine::new(store.clone(), Arc::new(ScrapeHealth::default()))
            .with_clock(clock.clone());
        assert_eq!(engine.ingest(vec![record("Australia", "India", "1.60")]).remapped, 1);

        for price in ["1.60", "1.65"] {
            clock.advance(Duration::seconds(1));
            let report = engine.ingest(vec![record("Australia", "India", price)]);
            assert_eq!(report.remapped, 0);
        }
        assert_eq!(store.mapping().len(), 1);
        assert_eq!(store.read_snapshot().matches[0].id.as_str(), "match_1xbet_9912");
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let (engine, _) = engine(10);
        let report = engine.ingest(vec![
            MatchRecord::new(None, Some("X".into()), start()),
            MatchRecord::new(None, Some("Y".into()), start()),
        ]);

        assert_eq!(report.new, 1);
        assert_eq!(report.duplicates, 1);
        let snapshot = engine.store().read_snapshot();
        assert_eq!(snapshot.matches[0].id.as_str(), "match_unknown_match");
        assert_eq!(snapshot.matches[0].team2.as_deref(), Some("X"));
    }

    #[test]
    fn persists_on_first_cycle_then_throttles() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::default()),
        )
        .with_persistence(
            Persistence::new(dir.path(), "odds.json", "mapping.json"),
            PersistPolicy::new(std::time::Duration::from_secs(60), 5),
        )
        .with_clock(clock.clone());

        assert!(engine.ingest(vec![record("A", "B", "1.50")]).persisted);
        clock.advance(Duration::seconds(1));
        assert!(!engine.ingest(vec![record("A", "B", "1.60")]).persisted);
        clock.advance(Duration::seconds(60));
        assert!(engine.ingest(vec![record("A", "B", "1.70")]).persisted);
    }

    #[test]
    fn burst_of_changes_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::default()),
        )
        .with_persistence(
            Persistence::new(dir.path(), "odds.json", "mapping.json"),
            PersistPolicy::new(std::time::Duration::from_secs(60), 2),
        )
        .with_clock(clock.clone());

        engine.ingest(vec![record("A", "B", "1.50")]);
        clock.advance(Duration::seconds(1));
        let report = engine.ingest(vec![
            record("A", "B", "1.60"),
            record("C", "D", "2.00"),
            record("E", "F", "3.00"),
        ]);
        assert_eq!(report.matches_touched, 3);
        assert!(report.persisted);
    }

    #[test]
    fn persistence_failure_does_not_block_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::default()),
        )
        .with_persistence(
            Persistence::new(&blocker, "odds.json", "mapping.json"),
            PersistPolicy::default(),
        );

        let report = engine.ingest(vec![record("A", "B", "1.50")]);
        assert!(!report.persisted);
        assert_eq!(engine.store().read_snapshot().len(), 1);
        assert!(!engine.flush());
    }

    #[test]
    fn failed_save_waits_a_full_interval_before_retrying() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::write(&data_dir, b"file").unwrap();

        let clock = Arc::new(ManualClock::new(start()));
        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::default()),
        )
        .with_persistence(
            Persistence::new(&data_dir, "odds.json", "mapping.json"),
            PersistPolicy::new(std::time::Duration::from_secs(60), 1),
        )
        .with_clock(clock.clone());

        assert!(!engine.ingest(vec![record("A", "B", "1.50")]).persisted);
        std::fs::remove_file(&data_dir).unwrap();

        // Even a burst does not retry inside the interval.
        clock.advance(Duration::seconds(1));
        let burst = engine.ingest(vec![record("A", "B", "1.55"), record("C", "D", "2.00")]);
        assert_eq!(burst.matches_touched, 2);
        assert!(!burst.persisted);
        assert!(!data_dir.join("odds.json").exists());

        clock.advance(Duration::seconds(60));
        assert!(engine.ingest(vec![record("A", "B", "1.60"), record("C", "D", "2.00")]).persisted);
        assert!(data_dir.join("odds.json").exists());
    }
}
