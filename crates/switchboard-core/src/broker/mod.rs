//! Broker client implementations
//!
//! The facade only talks to `dyn BrokerClient`. Two implementations ship:
//!
//! - `RedisBroker`: the production broker (Redis streams, consumer groups, pub/sub)
//! - `MemoryBroker`: same semantics in-process, for tests and `--broker memory`

mod traits;
mod error;
mod memory;
mod redis_broker;

pub use traits::BrokerClient;
pub use error::{BrokerError, BrokerResult};
pub use memory::MemoryBroker;
pub use redis_broker::RedisBroker;

use crate::logging::Logger;
use std::sync::Arc;

/// Connect the broker named by `kind` ("redis" or "memory")
pub async fn connect_broker(
    kind: &str,
    redis_url: &str,
    logger: Arc<dyn Logger>,
) -> BrokerResult<Arc<dyn BrokerClient>> {
    match kind.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryBroker::new(logger))),
        "redis" => Ok(Arc::new(RedisBroker::connect(redis_url, logger).await?)),
        other => Err(BrokerError::Connection(format!("unknown broker kind: {}", other))),
    }
}

/// List all supported broker kinds
pub fn supported_brokers() -> Vec<&'static str> {
    vec!["redis", "memory"]
}
