//! Resolved process configuration

use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult, ConfigSource};

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_EVENTS_STREAM: &str = "agent:events";
pub const DEFAULT_SESSION_STREAM: &str = "agent:session_log";
pub const DEFAULT_GROUP: &str = "triage";
pub const DEFAULT_CONSUMER: &str = "worker-1";
pub const DEFAULT_BROKER: &str = "redis";

/// Values a configuration source may set; unset fields fall through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }
}

/// Stream, group and consumer used when a tool call omits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDefaults {
    /// Default events stream
    pub stream: String,
    /// Session log stream (reserved; no tool writes to it yet)
    pub session_stream: String,
    /// Default consumer group
    pub group: String,
    /// Default consumer name
    pub consumer: String,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            stream: DEFAULT_EVENTS_STREAM.to_string(),
            session_stream: DEFAULT_SESSION_STREAM.to_string(),
            group: DEFAULT_GROUP.to_string(),
            consumer: DEFAULT_CONSUMER.to_string(),
        }
    }
}

/// Process configuration, fixed after startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    /// Broker connection address
    pub redis_url: String,
    /// Broker implementation ("redis" or "memory")
    pub broker: String,
    /// Defaults applied to tool calls
    pub defaults: StreamDefaults,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            broker: DEFAULT_BROKER.to_string(),
            defaults: StreamDefaults::default(),
        }
    }
}

impl SwitchboardConfig {
    /// Apply one layer of overrides on top of the current values
    pub fn apply(&mut self, overrides: ConfigOverrides) -> ConfigResult<()> {
        fn set(target: &mut String, key: &str, value: Option<String>) -> ConfigResult<()> {
            if let Some(value) = value {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ConfigError::invalid(key, "must not be empty"));
                }
                *target = value.to_string();
            }
            Ok(())
        }

        set(&mut self.redis_url, "redis_url", overrides.redis_url)?;
        set(&mut self.broker, "broker", overrides.broker)?;
        set(&mut self.defaults.stream, "stream", overrides.stream)?;
        set(&mut self.defaults.session_stream, "session_stream", overrides.session_stream)?;
        set(&mut self.defaults.group, "group", overrides.group)?;
        set(&mut self.defaults.consumer, "consumer", overrides.consumer)?;
        Ok(())
    }

    /// Resolve configuration from sources, later sources winning
    pub fn resolve(sources: &[&dyn ConfigSource]) -> ConfigResult<Self> {
        let mut config = Self::default();
        for source in sources {
            config.apply(source.load()?)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigSource;

    #[test]
    fn test_defaults() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.broker, "redis");
        assert_eq!(config.defaults.stream, "agent:events");
        assert_eq!(config.defaults.session_stream, "agent:session_log");
        assert_eq!(config.defaults.group, "triage");
        assert_eq!(config.defaults.consumer, "worker-1");
    }

    #[test]
    fn test_later_sources_win() {
        let file = MemoryConfigSource::new(
            ConfigOverrides::new()
                .with_stream("file:stream")
                .with_group("file-group"),
        );
        let env = MemoryConfigSource::new(ConfigOverrides::new().with_group("env-group"));

        let config = SwitchboardConfig::resolve(&[&file, &env]).unwrap();
        assert_eq!(config.defaults.stream, "file:stream");
        assert_eq!(config.defaults.group, "env-group");
        assert_eq!(config.defaults.consumer, "worker-1");
    }

    #[test]
    fn test_empty_value_rejected() {
        let mut config = SwitchboardConfig::default();
        let err = config
            .apply(ConfigOverrides::new().with_consumer("  "))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "consumer"));
    }
}
