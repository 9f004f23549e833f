//! Per-match change history with a fixed capacity.

use std::collections::VecDeque;

use crate::domain::ChangeHistoryEntry;

/// Ring buffer of the most recent changes for one match.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<ChangeHistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(16)),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when full.
    pub fn push(&mut self, entry: ChangeHistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChangeHistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ChangeHistoryEntry> {
        self.entries.iter().copied().collect()
    }
}
