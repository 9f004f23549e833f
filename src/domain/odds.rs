//! Back/lay odds ladders and their structural comparison.
//!
//! Prices stay in the source's display form. They are compared as strings so
//! a ladder never changes because of float rounding.

use serde::{Deserialize, Serialize};

/// Price strings that mean "nothing on offer at this rung".
const NO_OFFER: [&str; 3] = ["", "-", "no offer"];

/// One rung of a ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddEntry {
    pub position: u32,
    pub price: String,
    #[serde(default)]
    pub volume: Option<String>,
}

impl OddEntry {
    /// Build an entry, or `None` when the price is a no-offer sentinel.
    pub fn new(position: u32, price: impl Into<String>, volume: Option<String>) -> Option<Self> {
        let price = price.into().trim().to_string();
        if is_no_offer(&price) {
            return None;
        }
        Some(Self {
            position,
            price,
            volume: volume.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        })
    }
}

/// Both sides of a match's odds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsLadder {
    #[serde(default)]
    pub back: Vec<OddEntry>,
    #[serde(default)]
    pub lay: Vec<OddEntry>,
}

impl OddsLadder {
    pub fn new(back: Vec<OddEntry>, lay: Vec<OddEntry>) -> Self {
        Self { back, lay }
    }

    pub fn is_empty(&self) -> bool {
        self.back.is_empty() && self.lay.is_empty()
    }
}

/// True when `price` is one of the no-offer sentinels.
pub fn is_no_offer(price: &str) -> bool {
    let price = price.trim();
    NO_OFFER.iter().any(|s| price.eq_ignore_ascii_case(s))
}

/// Strip thousands separators and whitespace from a displayed volume.
///
/// Currency symbols are kept; only `,` and whitespace are removed.
pub fn normalize_volume(volume: &str) -> String {
    volume
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// Structural equality of two ladders, side by side, by position.
///
/// Two empty ladders are equal; an empty ladder never equals a populated one.
pub fn odds_equal(old: &OddsLadder, new: &OddsLadder) -> bool {
    side_equal(&old.back, &new.back) && side_equal(&old.lay, &new.lay)
}

fn side_equal(old: &[OddEntry], new: &[OddEntry]) -> bool {
    if old.len() != new.len() {
        return false;
    }

    let mut old: Vec<&OddEntry> = old.iter().collect();
    let mut new: Vec<&OddEntry> = new.iter().collect();
    old.sort_by_key(|e| e.position);
    new.sort_by_key(|e| e.position);

    old.iter().zip(new.iter()).all(|(a, b)| entry_equal(a, b))
}

fn entry_equal(a: &OddEntry, b: &OddEntry) -> bool {
    if a.price != b.price {
        return false;
    }
    match (&a.volume, &b.volume) {
        (None, None) => true,
        (Some(x), Some(y)) => normalize_volume(x) == normalize_volume(y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u32, price: &str, volume: Option<&str>) -> OddEntry {
        OddEntry::new(position, price, volume.map(str::to_string)).unwrap()
    }

    fn ladder(back: Vec<OddEntry>, lay: Vec<OddEntry>) -> OddsLadder {
        OddsLadder::new(back, lay)
    }

    #[test]
    fn no_offer_prices_are_dropped() {
        assert!(OddEntry::new(0, "-", None).is_none());
        assert!(OddEntry::new(0, "  ", None).is_none());
        assert!(OddEntry::new(0, "No Offer", Some("10".into())).is_none());
        assert!(OddEntry::new(0, "1.50", None).is_some());
    }

    #[test]
    fn reflexive() {
        let odds = ladder(
            vec![entry(0, "1.50", Some("1,000")), entry(1, "1.52", None)],
            vec![entry(0, "1.55", Some("250"))],
        );
        assert!(odds_equal(&odds, &odds.clone()));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = ladder(
            vec![entry(0, "1.50", None), entry(1, "1.48", None), entry(2, "1.45", None)],
            vec![],
        );
        let b = ladder(
            vec![entry(2, "1.45", None), entry(0, "1.50", None), entry(1, "1.48", None)],
            vec![],
        );
        assert!(odds_equal(&a, &b));
    }

    #[test]
    fn price_is_compared_as_text() {
        let a = ladder(vec![entry(0, "1.5", None)], vec![]);
        let b = ladder(vec![entry(0, "1.50", None)], vec![]);
        assert!(!odds_equal(&a, &b));
    }

    #[test]
    fn volume_separators_are_ignored() {
        let a = ladder(vec![entry(0, "2.10", Some("1,234"))], vec![]);
        let b = ladder(vec![entry(0, "2.10", Some("1234"))], vec![]);
        let c = ladder(vec![entry(0, "2.10", Some("1 234"))], vec![]);
        assert!(odds_equal(&a, &b));
        assert!(odds_equal(&a, &c));
    }

    #[test]
    fn volume_presence_matters() {
        let a = ladder(vec![entry(0, "2.10", Some("500"))], vec![]);
        let b = ladder(vec![entry(0, "2.10", None)], vec![]);
        assert!(!odds_equal(&a, &b));
    }

    #[test]
    fn length_mismatch_on_either_side() {
        let a = ladder(vec![entry(0, "2.10", None)], vec![entry(0, "2.12", None)]);
        let b = ladder(vec![entry(0, "2.10", None)], vec![]);
        assert!(!odds_equal(&a, &b));
        assert!(!odds_equal(&b, &a));
    }

    #[test]
    fn empty_ladders() {
        let empty = OddsLadder::default();
        let populated = ladder(vec![entry(0, "2.10", None)], vec![]);
        assert!(odds_equal(&empty, &OddsLadder::default()));
        assert!(!odds_equal(&empty, &populated));
        assert!(empty.is_empty());
    }

    #[test]
    fn normalize_volume_keeps_currency() {
        assert_eq!(normalize_volume("₹1,20,000"), "₹120000");
        assert_eq!(normalize_volume(" 5 000 "), "5000");
    }
}
