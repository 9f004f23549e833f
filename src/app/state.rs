//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;

use crate::engine::{Phase, ReconciliationEngine, ScrapeHealth};
use crate::store::SnapshotStore;

/// Service health as reported by `/api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub status: Phase,
    pub last_updated: Option<DateTime<Utc>>,
    pub matches_count: usize,
    pub is_running: bool,
    pub error_count: u32,
    pub uptime_seconds: u64,
    pub changes_since_last_update: usize,
}

/// State shared by the poller and the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<ReconciliationEngine>,
    refresh: Arc<Notify>,
}

impl AppState {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self {
            engine,
            refresh: Arc::new(Notify::new()),
        }
    }

    pub fn engine(&self) -> &Arc<ReconciliationEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        self.engine.store()
    }

    pub fn health(&self) -> &Arc<ScrapeHealth> {
        self.engine.health()
    }

    /// Handle the poller waits on for out-of-schedule cycles.
    pub fn refresh_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh)
    }

    /// Ask the poller to run a cycle now. Requests made while a cycle is
    /// already pending collapse into one.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn status(&self) -> ServiceStatus {
        let store = self.store().status();
        let health = self.health();
        ServiceStatus {
            status: health.phase(),
            last_updated: store.last_updated,
            matches_count: store.matches_count,
            is_running: health.is_running(),
            error_count: health.consecutive_errors(),
            uptime_seconds: health.uptime_seconds(self.engine.clock().now()),
            changes_since_last_update: store.changes_since_last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchRecord;
    use crate::engine::ManualClock;
    use chrono::Duration;

    #[test]
    fn status_combines_store_and_health() {
        let start: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let engine = ReconciliationEngine::new(
            Arc::new(SnapshotStore::default()),
            Arc::new(ScrapeHealth::new(3)),
        )
        .with_clock(clock.clone());
        let state = AppState::new(Arc::new(engine));

        let before = state.status();
        assert_eq!(before.status, Phase::Idle);
        assert!(before.last_updated.is_none());
        assert_eq!(before.uptime_seconds, 0);

        state.health().mark_started(start);
        state.engine().ingest(vec![MatchRecord::new(
            Some("India".into()),
            Some("Australia".into()),
            start,
        )]);
        state.health().record_failure();
        clock.advance(Duration::seconds(42));

        let status = state.status();
        assert_eq!(status.status, Phase::Starting);
        assert!(status.is_running);
        assert_eq!(status.matches_count, 1);
        assert_eq!(status.changes_since_last_update, 1);
        assert_eq!(status.error_count, 1);
        assert_eq!(status.uptime_seconds, 42);
    }
}
