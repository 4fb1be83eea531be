//! Stream entries and pending-entry summaries

use serde::{Deserialize, Serialize};

use super::stream_id::StreamId;

/// One stream entry as stored by the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Entry id
    pub id: StreamId,
    /// Fields in stored order, values in text form
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    pub fn new(id: StreamId, fields: Vec<(String, String)>) -> Self {
        Self { id, fields }
    }

    /// Get a field value by name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }
}

/// Pending count for one consumer of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerPending {
    /// Consumer name
    pub name: String,
    /// Entries delivered to this consumer and not yet acknowledged
    pub pending: u64,
}

/// Summary of a group's pending entry list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSummary {
    /// Total pending entries
    pub count: u64,
    /// Lowest pending id (absent when nothing is pending)
    pub first_id: Option<StreamId>,
    /// Highest pending id (absent when nothing is pending)
    pub last_id: Option<StreamId>,
    /// Per-consumer counts, sorted by name, consumers with nothing pending omitted
    pub consumers: Vec<ConsumerPending>,
}

impl PendingSummary {
    /// Pending count for a consumer (0 if it has none)
    pub fn pending_for(&self, consumer: &str) -> u64 {
        self.consumers
            .iter()
            .find(|c| c.name == consumer)
            .map(|c| c.pending)
            .unwrap_or(0)
    }
}
