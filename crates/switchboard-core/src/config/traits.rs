//! Configuration source trait

use super::settings::ConfigOverrides;

/// A source of configuration values
///
/// Implementations:
/// - `MemoryConfigSource`: Fixed values for testing
/// - `FileConfigSource`: YAML file (~/.config/agent-switchboard/config.yaml)
/// - `EnvConfigSource`: Process environment (`REDIS_URL`, `AGENT_*`)
///
/// Sources only report what they set; `SwitchboardConfig::resolve` layers them.
pub trait ConfigSource: Send + Sync {
    /// Source name for logs (e.g., "env", "file")
    fn name(&self) -> &str;

    /// Load the values this source sets
    fn load(&self) -> ConfigResult<ConfigOverrides>;
}

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
