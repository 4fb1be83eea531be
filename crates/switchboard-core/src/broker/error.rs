//! Broker error types

use thiserror::Error;

/// Errors reported by a broker client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Consumer group already exists on the stream
    #[error("BUSYGROUP Consumer group '{group}' already exists on '{stream}'")]
    GroupExists { stream: String, group: String },

    /// Stream or consumer group does not exist
    #[error("NOGROUP No such key '{stream}' or consumer group '{group}'")]
    NoGroup { stream: String, group: String },

    /// Broker rejected the command
    #[error("{code} {message}")]
    Command { code: String, message: String },

    /// Connection unusable (refused, dropped, timed out)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Unexpected reply shape
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl BrokerError {
    /// Structured error code, matching the broker's own codes where it has one
    pub fn code(&self) -> &str {
        match self {
            BrokerError::GroupExists { .. } => "BUSYGROUP",
            BrokerError::NoGroup { .. } => "NOGROUP",
            BrokerError::Command { code, .. } => code,
            BrokerError::Connection(_) => "CONNECTION",
            BrokerError::Protocol(_) => "PROTOCOL",
        }
    }

    /// Create a command error
    pub fn command(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a group-exists error
    pub fn group_exists(stream: impl Into<String>, group: impl Into<String>) -> Self {
        Self::GroupExists {
            stream: stream.into(),
            group: group.into(),
        }
    }

    /// Create a no-group error
    pub fn no_group(stream: impl Into<String>, group: impl Into<String>) -> Self {
        Self::NoGroup {
            stream: stream.into(),
            group: group.into(),
        }
    }

    pub fn is_group_exists(&self) -> bool {
        matches!(self, BrokerError::GroupExists { .. })
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
