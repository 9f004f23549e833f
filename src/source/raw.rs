//! Loosely typed match records as produced by scrapers and feeds.
//!
//! Everything is optional and unknown fields are ignored. Coercion into a
//! [`MatchRecord`] happens once, here, so the engine never has to probe for
//! missing keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::{MatchRecord, OddEntry, OddsLadder};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOdd {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub volume: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOdds {
    #[serde(default)]
    pub back: Vec<RawOdd>,
    #[serde(default)]
    pub lay: Vec<RawOdd>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub team1: Option<String>,
    #[serde(default)]
    pub team2: Option<String>,
    #[serde(default, alias = "scheduled_date", alias = "match_date")]
    pub date: Option<String>,
    #[serde(default, alias = "scheduled_time", alias = "match_time")]
    pub time: Option<String>,
    #[serde(default)]
    pub in_play: Option<bool>,
    #[serde(default)]
    pub score: Option<Vec<String>>,
    #[serde(default)]
    pub odds: Option<RawOdds>,
}

impl RawMatch {
    /// Coerce into a record stamped with `captured_at`.
    ///
    /// A record counts as in play when the source says so, or, if it says
    /// nothing, when it carries a non-empty scoreboard.
    pub fn into_record(self, captured_at: DateTime<Utc>) -> MatchRecord {
        let mut record = MatchRecord::new(clean(self.team1), clean(self.team2), captured_at);

        record.scheduled_date = clean(self.date);
        record.scheduled_time = clean(self.time);

        let score: Option<Vec<String>> = self.score.map(|cells| {
            cells
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        });
        record.score = score.filter(|cells| !cells.is_empty());
        record.in_play = self.in_play.unwrap_or(record.score.is_some());

        if let Some(odds) = self.odds {
            record.odds = OddsLadder::new(side(odds.back), side(odds.lay));
        }

        record
    }
}

fn side(raw: Vec<RawOdd>) -> Vec<OddEntry> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, odd)| {
            let position = odd.position.unwrap_or(i as u32);
            OddEntry::new(position, odd.price?, odd.volume)
        })
        .collect()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept a string, a number or null.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn coerces_loose_json() {
        let json = r#"{
            "team1": " India ",
            "team2": "Australia",
            "match_date": "1 May",
            "score": ["IND 120/3", " "],
            "draw": {"price": "3.4"},
            "odds": {
                "back": [{"price": "1.50", "volume": 1200}, {"price": "-"}, {"price": 1.48}],
                "lay": [{"position": 4, "price": "1.52", "volume": "2,000"}]
            }
        }"#;
        let raw: RawMatch = serde_json::from_str(json).unwrap();
        let record = raw.into_record(ts());

        assert_eq!(record.id.as_str(), "match_australia__vs__india");
        assert_eq!(record.team1.as_deref(), Some("India"));
        assert_eq!(record.scheduled_date.as_deref(), Some("1 May"));
        assert_eq!(record.score, Some(vec!["IND 120/3".to_string()]));
        assert!(record.in_play);

        let back = &record.odds.back;
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].volume.as_deref(), Some("1200"));
        assert_eq!(back[1].position, 2);
        assert_eq!(back[1].price, "1.48");
        assert_eq!(record.odds.lay[0].position, 4);
    }

    #[test]
    fn missing_everything_still_coerces() {
        let raw: RawMatch = serde_json::from_str("{}").unwrap();
        let record = raw.into_record(ts());
        assert_eq!(record.id.as_str(), "match_unknown_match");
        assert!(record.odds.is_empty());
        assert!(!record.in_play);
        assert!(record.score.is_none());
    }

    #[test]
    fn explicit_in_play_wins() {
        let raw = RawMatch {
            team1: Some("A".into()),
            in_play: Some(false),
            score: Some(vec!["1-0".into()]),
            ..RawMatch::default()
        };
        assert!(!raw.into_record(ts()).in_play);
    }
}
