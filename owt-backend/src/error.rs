//! Error types for the backend layer.

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur when talking to a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network error (connection, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The element does not exist.
    #[error("{element_type} not found: {id}")]
    NotFound { element_type: String, id: String },

    /// Credentials missing or rejected.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The backend rejected the payload.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Element type outside the known set.
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// Malformed element payload.
    #[error("model error: {0}")]
    Model(#[from] owt_model::ModelError),

    /// Local storage error.
    #[error("storage error: {0}")]
    Storage(#[from] owt_storage::StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Returns true for errors a retry may resolve.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
