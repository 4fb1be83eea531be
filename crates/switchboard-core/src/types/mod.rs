//! Core types for stream coordination
//!
//! This module contains the values shared by the broker clients and the facade.

mod stream_id;
mod field;
mod entry;
mod options;

pub use stream_id::{StreamId, AppendId, ReadFrom, GroupStart, GroupReadFrom, ParseIdError};
pub use field::{FieldMap, FieldValue, FieldMapError};
pub use entry::{StreamEntry, PendingSummary, ConsumerPending};
pub use options::{
    ReadOptions, CreateGroupOptions, GroupReadOptions, block_duration,
    DEFAULT_COUNT, DEFAULT_READ_BLOCK_MS, DEFAULT_GROUP_READ_BLOCK_MS, DEFAULT_MKSTREAM,
};
