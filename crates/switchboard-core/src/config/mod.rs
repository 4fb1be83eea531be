//! Process configuration
//!
//! Layered, later wins: built-in defaults, YAML file, environment, CLI flags.
//! - `FileConfigSource`: YAML file (user level or explicit path)
//! - `EnvConfigSource`: `REDIS_URL` and `AGENT_*` variables
//! - `MemoryConfigSource`: fixed values (tests, CLI flags)

mod traits;
mod settings;
mod memory;
mod env;
mod file;

pub use traits::{ConfigSource, ConfigError, ConfigResult};
pub use settings::{
    SwitchboardConfig, StreamDefaults, ConfigOverrides,
    DEFAULT_REDIS_URL, DEFAULT_EVENTS_STREAM, DEFAULT_SESSION_STREAM,
    DEFAULT_GROUP, DEFAULT_CONSUMER, DEFAULT_BROKER,
};
pub use memory::MemoryConfigSource;
pub use env::EnvConfigSource;
pub use file::FileConfigSource;
