use std::collections::VecDeque;

use async_trait::async_trait;
use oddsfeed::domain::MatchRecord;
use oddsfeed::source::{MatchSource, SourceError};
use parking_lot::Mutex;

/// Deterministic test double: each fetch pops the next scripted batch.
/// `None` stands for a failed scrape.
#[derive(Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Option<Vec<MatchRecord>>>>,
}

impl ScriptedSource {
    pub fn push_batch(&self, batch: Vec<MatchRecord>) {
        self.steps.lock().push_back(Some(batch));
    }

    pub fn push_failure(&self) {
        self.steps.lock().push_back(None);
    }
}

#[async_trait]
impl MatchSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> Result<Vec<MatchRecord>, SourceError> {
        match self.steps.lock().pop_front() {
            Some(Some(batch)) if !batch.is_empty() => Ok(batch),
            _ => Err(SourceError::Empty),
        }
    }
}
