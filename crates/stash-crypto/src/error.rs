//! Error types for the stash-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The OS random source failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Invalid key format or length
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// MAC verification failed
    #[error("signature verification failed")]
    SignatureVerification,

    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Hex decode error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
