//! Silent logger

use super::traits::{Level, Logger};

/// Discards every message; the default for tests and in-process brokers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
