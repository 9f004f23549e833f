//! Fixed-interval scrape loop.
//!
//! Each cycle fetches one batch from the configured source and hands it to
//! the engine. Failed fetches only bump the consecutive-error counter; the
//! counter is reset after a successful ingest so the batch that ends a
//! failure streak still sees the degraded state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::engine::{IngestReport, Phase, ReconciliationEngine};
use crate::source::MatchSource;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ingested(IngestReport),
    Failed { consecutive_errors: u32 },
}

pub struct Poller {
    source: Box<dyn MatchSource>,
    engine: Arc<ReconciliationEngine>,
    interval: Duration,
    refresh: Arc<Notify>,
}

impl Poller {
    pub fn new(
        source: Box<dyn MatchSource>,
        engine: Arc<ReconciliationEngine>,
        interval: Duration,
        refresh: Arc<Notify>,
    ) -> Self {
        Self {
            source,
            engine,
            interval,
            refresh,
        }
    }

    /// Run one fetch-and-ingest cycle.
    pub async fn poll_once(&self) -> PollOutcome {
        let health = Arc::clone(self.engine.health());

        let batch = match self.source.fetch().await {
            Ok(batch) => batch,
            Err(e) => {
                let consecutive_errors = health.record_failure();
                if consecutive_errors == health.recovery_threshold() {
                    warn!(
                        source = self.source.name(),
                        error = %e,
                        consecutive_errors,
                        "Scrape failing repeatedly; absent matches will be retained"
                    );
                } else {
                    warn!(source = self.source.name(), error = %e, consecutive_errors, "Scrape failed");
                }
                return PollOutcome::Failed { consecutive_errors };
            }
        };

        debug!(source = self.source.name(), records = batch.len(), "Batch fetched");
        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || engine.ingest(batch)).await {
            Ok(report) => {
                health.record_success();
                health.set_phase(Phase::Running);
                PollOutcome::Ingested(report)
            }
            Err(e) => {
                error!(error = %e, "Ingest task aborted");
                PollOutcome::Failed {
                    consecutive_errors: health.record_failure(),
                }
            }
        }
    }

    /// Poll until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let health = Arc::clone(self.engine.health());
        health.mark_started(self.engine.clock().now());
        info!(
            source = self.source.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Poller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(_) => {
                            if *shutdown.borrow() {
                                info!("Poller stopping");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                    continue;
                }
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {
                    debug!("Manual refresh requested");
                    ticker.reset();
                }
            }
            self.poll_once().await;
        }

        health.mark_stopped(Phase::Stopped);
    }
}
