//! Logger backed by `tracing`

use super::traits::{Level, Logger};

/// A logger that forwards to `tracing` events
///
/// The binary installs a `tracing-subscriber` writing to stderr; stdout
/// carries the MCP channel and must stay clean.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Create a tracing logger with the default component name
    pub fn new() -> Self {
        Self {
            component: "switchboard".to_string(),
        }
    }

    /// Create a tracing logger tagging events with a component name
    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!(component = %self.component, "{}", message),
            Level::Info => tracing::info!(component = %self.component, "{}", message),
            Level::Warn => tracing::warn!(component = %self.component, "{}", message),
            Level::Error => tracing::error!(component = %self.component, "{}", message),
        }
    }
}
