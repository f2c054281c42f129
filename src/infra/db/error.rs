//! Connection establishment errors.

use sea_orm::DbErr;
use thiserror::Error;

/// Stage of a connection attempt that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Open,
    Probe,
}

impl std::fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptStage::Open => write!(f, "open"),
            AttemptStage::Probe => write!(f, "probe"),
        }
    }
}

/// A single failed attempt. Retried while attempts remain.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("failed to connect to database: {0}")]
    Open(#[source] DbErr),

    #[error("failed to ping database: {0}")]
    Probe(#[source] DbErr),
}

impl AttemptError {
    /// Stage at which the attempt failed
    pub fn stage(&self) -> AttemptStage {
        match self {
            AttemptError::Open(_) => AttemptStage::Open,
            AttemptError::Probe(_) => AttemptStage::Probe,
        }
    }

    /// Underlying database error
    pub fn cause(&self) -> &DbErr {
        match self {
            AttemptError::Open(e) | AttemptError::Probe(e) => e,
        }
    }
}

/// Terminal connector errors. No handle is produced.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid connection parameters: {0}")]
    InvalidParameters(String),

    #[error("database unavailable after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: AttemptError,
    },

    #[error("connection cancelled during attempt {attempt}")]
    Cancelled { attempt: u32 },
}

impl ConnectError {
    /// Last observed failure, when retries ran out
    pub fn last_attempt_error(&self) -> Option<&AttemptError> {
        match self {
            ConnectError::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}
