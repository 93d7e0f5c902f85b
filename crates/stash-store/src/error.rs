//! Error types for the stash-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object not found
    #[error("object not found: {0}")]
    NotFound(String),

    /// The inbound content stream failed before the object was committed
    #[error("upload aborted for {key}: {reason}")]
    Aborted { key: String, reason: String },

    /// Write rejected by the backend
    #[error("write failed: {0}")]
    Write(String),

    /// Read failed in the backend
    #[error("read failed: {0}")]
    Read(String),

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error means the key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
