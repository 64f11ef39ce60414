//! Per-topic history of opened rounds.

use serde::{Deserialize, Serialize};
use snapshots_types::RoundId;
use std::collections::HashMap;

/// Topic → round ids in the order the rounds were opened. Append-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryIndex {
    by_topic: HashMap<String, Vec<RoundId>>,
}

impl HistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, topic: &str, id: RoundId) {
        self.by_topic.entry(topic.to_owned()).or_default().push(id);
    }

    /// Rounds opened for `topic`, oldest first. Empty for unknown topics.
    pub fn rounds_for(&self, topic: &str) -> &[RoundId] {
        self.by_topic.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn topic_count(&self) -> usize {
        self.by_topic.len()
    }
}
