//! Scraper health shared between the poller, the engine and the API.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Lifecycle phase of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopped,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopped => 3,
            Self::Failed => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Consecutive-failure counter and run state of the scraper.
pub struct ScrapeHealth {
    consecutive_errors: AtomicU32,
    recovery_threshold: u32,
    running: AtomicBool,
    phase: AtomicU8,
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl ScrapeHealth {
    pub fn new(recovery_threshold: u32) -> Self {
        Self {
            consecutive_errors: AtomicU32::new(0),
            recovery_threshold,
            running: AtomicBool::new(false),
            phase: AtomicU8::new(Phase::Idle.as_u8()),
            started_at: RwLock::new(None),
        }
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::SeqCst)
    }

    /// Returns the new count.
    pub fn record_failure(&self) -> u32 {
        self.consecutive_errors.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_success(&self) {
        self.consecutive_errors.store(0, Ordering::SeqCst);
    }

    pub fn recovery_threshold(&self) -> u32 {
        self.recovery_threshold
    }

    /// True once failures reach the threshold; absent matches are then kept.
    pub fn is_degraded(&self) -> bool {
        self.consecutive_errors() >= self.recovery_threshold
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn mark_started(&self, at: DateTime<Utc>) {
        self.running.store(true, Ordering::SeqCst);
        *self.started_at.write() = Some(at);
        self.set_phase(Phase::Starting);
    }

    pub fn mark_stopped(&self, phase: Phase) {
        self.running.store(false, Ordering::SeqCst);
        self.set_phase(phase);
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read()
    }

    /// Whole seconds since `mark_started`, zero if never started.
    pub fn uptime_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.started_at()
            .map(|s| now.signed_duration_since(s).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

impl Default for ScrapeHealth {
    fn default() -> Self {
        Self::new(10)
    }
}
