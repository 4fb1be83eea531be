//! File-based configuration source (YAML)
//!
//! Default location is `~/.config/agent-switchboard/config.yaml`:
//!
//! ```yaml
//! redis_url: redis://127.0.0.1:6379
//! stream: agent:events
//! group: triage
//! consumer: worker-1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::settings::ConfigOverrides;
use super::traits::{ConfigResult, ConfigSource};

/// YAML configuration file
///
/// A missing file is not an error; it sets nothing.
///
/// # Example
///
/// ```no_run
/// use switchboard_core::config::{ConfigSource, FileConfigSource};
///
/// let source = FileConfigSource::user();
/// let overrides = source.load().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Create a source for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// User-level config (~/.config/agent-switchboard/config.yaml)
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("agent-switchboard").join("config.yaml"))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl ConfigSource for FileConfigSource {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> ConfigResult<ConfigOverrides> {
        if !self.exists() {
            return Ok(ConfigOverrides::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigOverrides::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, SwitchboardConfig};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_sets_nothing() {
        let dir = tempdir().unwrap();
        let source = FileConfigSource::new(dir.path().join("config.yaml"));
        assert!(!source.exists());
        assert_eq!(source.load().unwrap(), ConfigOverrides::default());
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "redis_url: redis://cache:6379\nstream: ops:events\nconsumer: worker-7\n",
        )
        .unwrap();

        let source = FileConfigSource::new(&path);
        let config = SwitchboardConfig::resolve(&[&source]).unwrap();
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert_eq!(config.defaults.stream, "ops:events");
        assert_eq!(config.defaults.group, "triage");
        assert_eq!(config.defaults.consumer, "worker-7");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "streams: typo\n").unwrap();

        let err = FileConfigSource::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
