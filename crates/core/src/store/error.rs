use thiserror::Error;

use crate::retry::{Classify, FailureKind};

/// Errors that can occur while talking to the hosted backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{table} row not found: {id}")]
    NotFound { table: String, id: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a not-found error for a row of `table`.
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }
}

/// Maps a [`BackendError`] to the HTTP status code it stands for, if any.
///
/// - `Status` -> its own status
/// - `NotFound` -> 404
/// - `Timeout` -> 408
/// - `InvalidData` -> 422
/// - `Network` -> none (no response was received)
pub fn backend_error_status(error: &BackendError) -> Option<u16> {
    match error {
        BackendError::Status { status, .. } => Some(*status),
        BackendError::NotFound { .. } => Some(404),
        BackendError::Timeout(_) => Some(408),
        BackendError::InvalidData(_) => Some(422),
        BackendError::Network(_) => None,
    }
}

impl Classify for BackendError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            BackendError::Network(_) => FailureKind::NetworkUnavailable,
            BackendError::Timeout(_) => FailureKind::Timeout,
            other => backend_error_status(other)
                .map(FailureKind::from_status)
                .unwrap_or(FailureKind::Unknown),
        }
    }
}
