//! Switchboard Core
//!
//! Redis streams and pub/sub exposed as agent tools.
//! This crate holds everything except process setup, so the same pieces can
//! back the MCP stdio server, the REST bridge, or tests against an
//! in-process broker.
//!
//! ## Layers
//!
//! - `broker`: `BrokerClient` trait with Redis and in-memory implementations
//! - `facade`: argument validation, defaults and reply shaping
//! - `mcp`: the MCP server registering one tool per operation
//!
//! ```rust,ignore
//! use switchboard_core::{connect_broker, StreamFacade, SwitchboardServer, TracingLogger};
//!
//! let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());
//! let broker = connect_broker(&config.broker, &config.redis_url, logger.clone()).await?;
//! let facade = Arc::new(StreamFacade::new(broker, config.defaults, logger.clone()));
//!
//! SwitchboardServer::new(facade, logger).serve(stdio()).await?.waiting().await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod broker;
pub mod facade;
pub mod mcp;

// Re-export commonly used types
pub use types::{
    StreamId, AppendId, ReadFrom, GroupStart, GroupReadFrom,
    FieldMap, FieldValue, StreamEntry, PendingSummary, ConsumerPending,
    ReadOptions, CreateGroupOptions, GroupReadOptions,
};

pub use logging::{Logger, NoOpLogger, TracingLogger};

pub use config::{
    SwitchboardConfig, StreamDefaults, ConfigOverrides, ConfigSource, ConfigError,
    EnvConfigSource, FileConfigSource, MemoryConfigSource,
};

pub use broker::{
    BrokerClient, BrokerError, BrokerResult, MemoryBroker, RedisBroker,
    connect_broker, supported_brokers,
};

pub use facade::{StreamFacade, FacadeError, ValidationError, Reply, ErrorReply};

pub use mcp::SwitchboardServer;
