use chrono::{DateTime, Duration, Utc};
use oddsfeed::domain::{MatchRecord, OddEntry, OddsLadder};

pub fn t0() -> DateTime<Utc> {
    "2024-05-01T12:00:00Z".parse().expect("valid timestamp")
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(seconds)
}

/// A two-team record with a single back price at position 0.
pub fn record(team1: &str, team2: &str, back: &str) -> MatchRecord {
    let mut r = MatchRecord::new(Some(team1.into()), Some(team2.into()), t0());
    r.odds = ladder(&[back], &[]);
    r
}

pub fn ladder(back: &[&str], lay: &[&str]) -> OddsLadder {
    let side = |prices: &[&str]| {
        prices
            .iter()
            .enumerate()
            .filter_map(|(i, p)| OddEntry::new(i as u32, *p, None))
            .collect()
    };
    OddsLadder::new(side(back), side(lay))
}
