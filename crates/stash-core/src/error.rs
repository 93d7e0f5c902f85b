//! Error types for the stash-core crate

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the object pipeline
#[derive(Error, Debug)]
pub enum CoreError {
    /// Object not found
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    /// Upload exceeded the configured size ceiling
    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// The client's content stream failed before the upload completed
    #[error("upload of {key} aborted: {reason}")]
    UploadAborted { key: String, reason: String },

    /// Backend rejected or timed out a write
    #[error("backend write failed for {key}: {reason}")]
    BackendWrite { key: String, reason: String },

    /// Backend failed or timed out a read
    #[error("backend read failed: {reason}")]
    BackendRead { reason: String },

    /// A generated key fell outside the key alphabet
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

impl CoreError {
    /// Short name of the error kind, for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ObjectNotFound { .. } => "not_found",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::UploadAborted { .. } => "upload_aborted",
            Self::BackendWrite { .. } => "backend_write",
            Self::BackendRead { .. } => "backend_read",
            Self::InvalidKey(_) => "invalid_key",
        }
    }
}

/// Carried inside an `io::Error` by content streams that stop because a size
/// ceiling was hit, so the gateway can tell it apart from a disconnect.
#[derive(Error, Debug, Clone, Copy)]
#[error("payload exceeds {limit} bytes")]
pub struct SizeLimitExceeded {
    pub limit: u64,
}

impl SizeLimitExceeded {
    /// Wrap into an `io::Error` suitable for a content stream
    pub fn into_io(self) -> std::io::Error {
        std::io::Error::other(self)
    }

    /// Whether an `io::Error` carries this marker
    pub fn is_cause_of(err: &std::io::Error) -> bool {
        err.get_ref().is_some_and(|inner| inner.is::<SizeLimitExceeded>())
    }
}
