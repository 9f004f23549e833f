//! Content-derived match identity.
//!
//! Source sites assign their own identifiers to matches and rotate them
//! freely (page reloads, re-listing, home/away swaps). The only thing that
//! survives across polls is the pairing of team names, so the public id of
//! a match is derived from that pairing alone.
//!
//! Normalisation maps every character that is not an ASCII letter or digit
//! to `_`. Names written in non-Latin scripts therefore collapse onto
//! underscores and can collide; two distinct pairings whose names share an
//! alphanumeric skeleton collide as well. Both are known limitations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key used when a record carries no usable first team name.
pub const UNKNOWN_MATCH: &str = "unknown_match";

/// Prefix of every public match id.
pub const ID_PREFIX: &str = "match_";

const PAIR_SEPARATOR: &str = "__vs__";

/// Order-independent key derived from normalised team names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StableKey(String);

impl StableKey {
    /// Derive the key for a pairing of team names.
    ///
    /// `team2` equal to `team1`, empty or absent yields a single-name key.
    pub fn compute(team1: &str, team2: Option<&str>) -> Self {
        if team1.is_empty() {
            return Self(UNKNOWN_MATCH.to_string());
        }

        let mut names = match team2 {
            Some(other) if !other.is_empty() && other != team1 => {
                vec![normalize_name(team1), normalize_name(other)]
            }
            _ => vec![normalize_name(team1)],
        };
        names.sort();

        Self(names.join(PAIR_SEPARATOR))
    }

    /// True for the sentinel produced by records without team names.
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_MATCH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public id carried by records with this key.
    pub fn to_match_id(&self) -> MatchId {
        MatchId::new(format!("{ID_PREFIX}{}", self.0))
    }
}

impl fmt::Display for StableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public, externally stable match identifier.
///
/// Normally `match_<stable key>`, but ids restored from older snapshot files
/// are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Shorthand for `StableKey::compute(..).as_str()` as an owned string.
pub fn compute_key(team1: &str, team2: Option<&str>) -> String {
    StableKey::compute(team1, team2).0
}

/// Lower-case, map non-alphanumerics to `_`, collapse runs, trim.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}
