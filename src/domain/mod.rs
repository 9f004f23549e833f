//! Match domain: identity, odds, records and change classification.

pub mod change;
pub mod identity;
pub mod odds;
pub mod record;

pub use change::{classify, is_equal, ChangeSet};
pub use identity::{compute_key, MatchId, StableKey};
pub use odds::{odds_equal, OddEntry, OddsLadder};
pub use record::{ChangeHistoryEntry, MatchRecord, Snapshot};
