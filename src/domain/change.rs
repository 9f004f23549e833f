//! Classification of the delta between two versions of a match.

use serde::Serialize;

use super::odds::odds_equal;
use super::record::{ChangeHistoryEntry, MatchRecord};

/// What moved between two versions of the same match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub odds_changed: bool,
    pub score_changed: bool,
    pub status_changed: bool,
}

impl ChangeSet {
    pub fn any(&self) -> bool {
        self.odds_changed || self.score_changed || self.status_changed
    }

    pub fn to_entry(self, timestamp: chrono::DateTime<chrono::Utc>) -> ChangeHistoryEntry {
        ChangeHistoryEntry {
            timestamp,
            odds_changed: self.odds_changed,
            score_changed: self.score_changed,
            status_changed: self.status_changed,
        }
    }
}

/// Break the delta between `old` and `new` into odds, score and status.
pub fn classify(old: &MatchRecord, new: &MatchRecord) -> ChangeSet {
    ChangeSet {
        odds_changed: !odds_equal(&old.odds, &new.odds),
        score_changed: old.score != new.score,
        status_changed: old.in_play != new.in_play,
    }
}

/// Content equality, ignoring `id` and `captured_at`.
pub fn is_equal(old: &MatchRecord, new: &MatchRecord) -> bool {
    old.team1 == new.team1
        && old.team2 == new.team2
        && old.scheduled_date == new.scheduled_date
        && old.scheduled_time == new.scheduled_time
        && old.in_play == new.in_play
        && old.score == new.score
        && odds_equal(&old.odds, &new.odds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::odds::{OddEntry, OddsLadder};
    use chrono::{DateTime, Duration, Utc};

    fn ts() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn record(price: &str) -> MatchRecord {
        let mut r = MatchRecord::new(Some("India".into()), Some("Australia".into()), ts());
        r.odds = OddsLadder::new(OddEntry::new(0, price, None).into_iter().collect(), vec![]);
        r
    }

    #[test]
    fn identical_content_is_equal_despite_timestamp() {
        let old = record("1.50");
        let mut new = record("1.50");
        new.captured_at = ts() + Duration::seconds(5);
        new.id = "match_other".into();
        assert!(is_equal(&old, &new));
        assert!(!classify(&old, &new).any());
    }

    #[test]
    fn odds_move_is_classified() {
        let changes = classify(&record("1.50"), &record("1.55"));
        assert_eq!(
            changes,
            ChangeSet {
                odds_changed: true,
                score_changed: false,
                status_changed: false,
            }
        );
    }

    #[test]
    fn score_presence_counts_as_change() {
        let old = record("1.50");
        let mut new = record("1.50");
        new.score = Some(vec![]);
        assert!(classify(&old, &new).score_changed);
        assert!(!is_equal(&old, &new));
    }

    #[test]
    fn status_flip_is_classified() {
        let old = record("1.50");
        let mut new = record("1.50");
        new.in_play = true;
        new.score = Some(vec!["120/3".into()]);
        let changes = classify(&old, &new);
        assert!(changes.status_changed);
        assert!(changes.score_changed);
        assert!(!changes.odds_changed);
    }

    #[test]
    fn schedule_change_is_unequal_without_flags() {
        let old = record("1.50");
        let mut new = record("1.50");
        new.scheduled_time = Some("19:30".into());
        assert!(!is_equal(&old, &new));
        assert!(!classify(&old, &new).any());
    }

    #[test]
    fn change_set_to_entry() {
        let entry = classify(&record("1.50"), &record("1.60")).to_entry(ts());
        assert!(entry.odds_changed);
        assert_eq!(entry.timestamp, ts());
    }
}
