//! In-memory configuration source

use parking_lot::RwLock;

use super::settings::ConfigOverrides;
use super::traits::{ConfigResult, ConfigSource};

/// Fixed configuration values, for testing and for CLI flags
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    overrides: RwLock<ConfigOverrides>,
}

impl MemoryConfigSource {
    /// Create a source reporting these values
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self {
            overrides: RwLock::new(overrides),
        }
    }

    /// Replace the values (useful for testing)
    pub fn set(&self, overrides: ConfigOverrides) {
        *self.overrides.write() = overrides;
    }
}

impl ConfigSource for MemoryConfigSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> ConfigResult<ConfigOverrides> {
        Ok(self.overrides.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_source() {
        let source = MemoryConfigSource::default();
        assert_eq!(source.load().unwrap(), ConfigOverrides::default());

        source.set(ConfigOverrides::new().with_stream("s"));
        assert_eq!(source.load().unwrap().stream.as_deref(), Some("s"));
    }
}
