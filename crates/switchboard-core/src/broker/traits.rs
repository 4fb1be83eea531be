//! Broker client trait definition

use async_trait::async_trait;

use crate::types::{
    AppendId, CreateGroupOptions, FieldMap, GroupReadOptions, PendingSummary, ReadOptions,
    StreamEntry, StreamId,
};
use super::error::BrokerResult;

/// Broker client abstraction
///
/// Implementations:
/// - `RedisBroker`: Redis server over a multiplexed async connection
/// - `MemoryBroker`: In-process streams for testing and demos
///
/// Each method is one broker round trip. Blocking reads return an empty
/// vector when their wait elapses.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Broker name (e.g., "redis", "memory")
    fn name(&self) -> &str;

    /// Liveness check
    async fn ping(&self) -> BrokerResult<String>;

    /// Publish to a pub/sub channel, returning the number of listeners reached
    async fn publish(&self, channel: &str, message: &str) -> BrokerResult<u64>;

    /// Append an entry, returning its id
    async fn append(&self, stream: &str, id: AppendId, fields: &FieldMap) -> BrokerResult<StreamId>;

    /// Read entries without touching any consumer group
    async fn read(&self, options: &ReadOptions) -> BrokerResult<Vec<StreamEntry>>;

    /// Create a consumer group; an existing group is `BrokerError::GroupExists`
    async fn create_group(&self, options: &CreateGroupOptions) -> BrokerResult<()>;

    /// Read through a consumer group, recording deliveries in its PEL
    async fn read_group(&self, options: &GroupReadOptions) -> BrokerResult<Vec<StreamEntry>>;

    /// Acknowledge ids, returning how many were actually removed from the PEL
    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> BrokerResult<u64>;

    /// Summarize the group's PEL
    async fn pending(&self, stream: &str, group: &str) -> BrokerResult<PendingSummary>;
}
