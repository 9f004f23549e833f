//! Match records, snapshots and change-history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{MatchId, StableKey};
use super::odds::OddsLadder;

/// One match as last seen by the scraper.
///
/// Field names on disk follow the snapshot file format (`date`, `time`,
/// `timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2: Option<String>,
    #[serde(
        rename = "date",
        alias = "scheduled_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_date: Option<String>,
    #[serde(
        rename = "time",
        alias = "scheduled_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub in_play: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Vec<String>>,
    #[serde(default)]
    pub odds: OddsLadder,
    #[serde(rename = "timestamp", alias = "captured_at")]
    pub captured_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a record whose id is derived from its team names.
    pub fn new(team1: Option<String>, team2: Option<String>, captured_at: DateTime<Utc>) -> Self {
        let team1 = team1.filter(|t| !t.is_empty());
        let team2 = team2.filter(|t| !t.is_empty());
        let id = StableKey::compute(team1.as_deref().unwrap_or(""), team2.as_deref()).to_match_id();
        Self {
            id,
            team1,
            team2,
            scheduled_date: None,
            scheduled_time: None,
            in_play: false,
            score: None,
            odds: OddsLadder::default(),
            captured_at,
        }
    }

    /// Stable key recomputed from the current team names.
    pub fn stable_key(&self) -> StableKey {
        StableKey::compute(self.team1.as_deref().unwrap_or(""), self.team2.as_deref())
    }

    /// Id this record would be assigned if it were seen for the first time.
    pub fn derived_id(&self) -> MatchId {
        self.stable_key().to_match_id()
    }

    /// Display label, e.g. `India vs Australia`.
    pub fn label(&self) -> String {
        match (&self.team1, &self.team2) {
            (Some(a), Some(b)) => format!("{a} vs {b}"),
            (Some(a), None) => a.clone(),
            (None, Some(b)) => b.clone(),
            (None, None) => "unknown".to_string(),
        }
    }

    /// Case-insensitive substring match against either team name.
    pub fn involves_team(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.team1, &self.team2]
            .into_iter()
            .flatten()
            .any(|t| t.to_lowercase().contains(&needle))
    }
}

/// The complete set of current matches at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub matches: Vec<MatchRecord>,
}

impl Snapshot {
    pub fn new(captured_at: DateTime<Utc>, matches: Vec<MatchRecord>) -> Self {
        Self {
            captured_at,
            matches,
        }
    }

    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self::new(captured_at, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, id: &MatchId) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| &m.id == id)
    }
}

/// Why a match was touched in one ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub odds_changed: bool,
    pub score_changed: bool,
    pub status_changed: bool,
}

impl ChangeHistoryEntry {
    /// Entry recorded the first time a match is seen.
    pub fn first_seen(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            odds_changed: true,
            score_changed: false,
            status_changed: false,
        }
    }
}
