//! Environment variable configuration source

use std::env;

use super::settings::ConfigOverrides;
use super::traits::{ConfigResult, ConfigSource};

pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_BROKER: &str = "SWITCHBOARD_BROKER";
pub const ENV_EVENTS_STREAM: &str = "AGENT_EVENTS_STREAM";
pub const ENV_SESSION_STREAM: &str = "AGENT_SESSION_STREAM";
pub const ENV_CONSUMER_GROUP: &str = "AGENT_CONSUMER_GROUP";
pub const ENV_CONSUMER_NAME: &str = "AGENT_CONSUMER_NAME";

/// Configuration read from the process environment
///
/// Empty variables count as unset.
///
/// | variable               | setting          |
/// |------------------------|------------------|
/// | `REDIS_URL`            | broker address   |
/// | `SWITCHBOARD_BROKER`   | `redis`/`memory` |
/// | `AGENT_EVENTS_STREAM`  | default stream   |
/// | `AGENT_SESSION_STREAM` | session stream   |
/// | `AGENT_CONSUMER_GROUP` | default group    |
/// | `AGENT_CONSUMER_NAME`  | default consumer |
#[derive(Debug, Default)]
pub struct EnvConfigSource {
    _private: (),
}

impl EnvConfigSource {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn var(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &str {
        "env"
    }

    fn load(&self) -> ConfigResult<ConfigOverrides> {
        Ok(ConfigOverrides {
            redis_url: Self::var(ENV_REDIS_URL),
            broker: Self::var(ENV_BROKER),
            stream: Self::var(ENV_EVENTS_STREAM),
            session_stream: Self::var(ENV_SESSION_STREAM),
            group: Self::var(ENV_CONSUMER_GROUP),
            consumer: Self::var(ENV_CONSUMER_NAME),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // mutates process variables; keep serial
    #[test]
    #[serial]
    fn test_env_config_source() {
        let previous = env::var(ENV_CONSUMER_NAME).ok();

        env::set_var(ENV_CONSUMER_NAME, "worker-env");
        assert_eq!(
            EnvConfigSource::new().load().unwrap().consumer.as_deref(),
            Some("worker-env")
        );

        env::set_var(ENV_CONSUMER_NAME, "");
        assert_eq!(EnvConfigSource::new().load().unwrap().consumer, None);

        match previous {
            Some(v) => env::set_var(ENV_CONSUMER_NAME, v),
            None => env::remove_var(ENV_CONSUMER_NAME),
        }
    }
}
