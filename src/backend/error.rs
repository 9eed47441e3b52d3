//! Backend call error types.

use thiserror::Error;

/// Errors that can occur while talking to the session backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Could not reach the backend.
    #[error("cannot connect to backend: {0}")]
    Connection(String),

    /// The backend did not answer in time.
    #[error("backend timed out during {0}")]
    Timeout(&'static str),

    /// Request or response could not be encoded/decoded.
    #[error("malformed backend exchange: {0}")]
    Protocol(String),

    /// The backend answered with an error.
    #[error("{0}")]
    Rejected(String),

    /// The backend refused to serve the call (offline or injected failure).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Returns true if the call never produced a backend answer.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Returns true if the backend explicitly refused the call.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
