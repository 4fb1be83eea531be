//! Per-operation options with their documented defaults

use std::time::Duration;

use super::stream_id::{GroupReadFrom, GroupStart, ReadFrom};

/// Default maximum entries returned by a read
pub const DEFAULT_COUNT: usize = 1;

/// Default wait for a non-group read (0 = return immediately)
pub const DEFAULT_READ_BLOCK_MS: u64 = 0;

/// Default wait for a group read; this is the long-poll operation
pub const DEFAULT_GROUP_READ_BLOCK_MS: u64 = 15_000;

/// Group creation creates the stream when missing unless told otherwise
pub const DEFAULT_MKSTREAM: bool = true;

/// Convert a `block_ms` argument; 0 means do not wait
pub fn block_duration(block_ms: u64) -> Option<Duration> {
    (block_ms > 0).then(|| Duration::from_millis(block_ms))
}

/// Options for a non-group read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Stream to read
    pub stream: String,
    /// Exclusive starting position (default: entries appended after the call begins)
    pub from: ReadFrom,
    /// Maximum entries to return (default 1)
    pub count: usize,
    /// How long to wait for data; `None` returns immediately (default)
    pub block: Option<Duration>,
}

impl ReadOptions {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            from: ReadFrom::Latest,
            count: DEFAULT_COUNT,
            block: block_duration(DEFAULT_READ_BLOCK_MS),
        }
    }

    pub fn with_from(mut self, from: ReadFrom) -> Self {
        self.from = from;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_block(mut self, block: Option<Duration>) -> Self {
        self.block = block;
        self
    }
}

/// Options for creating a consumer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupOptions {
    pub stream: String,
    pub group: String,
    /// Initial cursor (default: the stream tail at creation time)
    pub start: GroupStart,
    /// Create the stream if it does not exist (default true)
    pub mkstream: bool,
}

impl CreateGroupOptions {
    pub fn new(stream: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            group: group.into(),
            start: GroupStart::Latest,
            mkstream: DEFAULT_MKSTREAM,
        }
    }

    pub fn with_start(mut self, start: GroupStart) -> Self {
        self.start = start;
        self
    }

    pub fn with_mkstream(mut self, mkstream: bool) -> Self {
        self.mkstream = mkstream;
        self
    }
}

/// Options for a consumer-group read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReadOptions {
    pub stream: String,
    pub group: String,
    pub consumer: String,
    /// Undelivered entries (default) or this consumer's pending history
    pub from: GroupReadFrom,
    /// Maximum entries to return (default 1)
    pub count: usize,
    /// How long to wait for new entries (default 15s); ignored for pending history
    pub block: Option<Duration>,
}

impl GroupReadOptions {
    pub fn new(
        stream: impl Into<String>,
        group: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            stream: stream.into(),
            group: group.into(),
            consumer: consumer.into(),
            from: GroupReadFrom::Undelivered,
            count: DEFAULT_COUNT,
            block: block_duration(DEFAULT_GROUP_READ_BLOCK_MS),
        }
    }

    pub fn with_from(mut self, from: GroupReadFrom) -> Self {
        self.from = from;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_block(mut self, block: Option<Duration>) -> Self {
        self.block = block;
        self
    }
}
