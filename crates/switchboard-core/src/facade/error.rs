//! Facade error types

use thiserror::Error;

use crate::broker::BrokerError;
use crate::types::{FieldMapError, ParseIdError};

/// Structural problems with tool arguments, found before any broker call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Fields(#[from] FieldMapError),

    #[error("{argument}: {source}")]
    Id {
        argument: &'static str,
        #[source]
        source: ParseIdError,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("count must be at least 1")]
    ZeroCount,

    #[error("ids must contain at least one id")]
    NoIds,
}

impl ValidationError {
    pub fn id(argument: &'static str, source: ParseIdError) -> Self {
        Self::Id { argument, source }
    }
}

/// Errors returned by facade operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacadeError {
    /// Malformed or missing arguments; never retried
    #[error("Invalid arguments: {0}")]
    Validation(#[from] ValidationError),

    /// Broker rejected the command or the connection is unusable
    #[error("{0}")]
    Operational(#[from] BrokerError),
}

impl FacadeError {
    /// "validation" or "operational"
    pub fn kind(&self) -> &'static str {
        match self {
            FacadeError::Validation(_) => "validation",
            FacadeError::Operational(_) => "operational",
        }
    }

    /// Broker error code, for operational errors
    pub fn code(&self) -> Option<&str> {
        match self {
            FacadeError::Validation(_) => None,
            FacadeError::Operational(err) => Some(err.code()),
        }
    }
}

pub type FacadeResult<T> = Result<T, FacadeError>;
