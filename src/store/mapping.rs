//! Legacy-id to current-id redirects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::MatchId;

/// Append-only map from superseded ids to the id that replaced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMapping(BTreeMap<MatchId, MatchId>);

impl IdentityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `legacy -> current` unless `legacy` is already mapped.
    ///
    /// Returns false for self-maps and for legacy ids that already point
    /// somewhere; existing entries are never overwritten.
    pub fn insert(&mut self, legacy: MatchId, current: MatchId) -> bool {
        if legacy == current || self.0.contains_key(&legacy) {
            return false;
        }
        self.0.insert(legacy, current);
        true
    }

    /// One hop only.
    pub fn resolve(&self, id: &MatchId) -> Option<&MatchId> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MatchId, &MatchId)> {
        self.0.iter()
    }
}

impl FromIterator<(MatchId, MatchId)> for IdentityMapping {
    fn from_iter<I: IntoIterator<Item = (MatchId, MatchId)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (legacy, current) in iter {
            mapping.insert(legacy, current);
        }
        mapping
    }
}
