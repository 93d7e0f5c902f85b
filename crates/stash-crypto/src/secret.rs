//! Server secret and random identifiers
//!
//! The server secret is generated once from the OS random source, persisted
//! as lowercase hex, and used as the BLAKE3 key for session token MACs.

use crate::{CryptoError, Result, SECRET_BYTE_SIZE};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 256-bit server-wide secret
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ServerSecret([u8; SECRET_BYTE_SIZE]);

impl ServerSecret {
    /// Generate a fresh secret from the OS random source
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SECRET_BYTE_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Wrap existing key bytes
    pub fn from_bytes(bytes: [u8; SECRET_BYTE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a persisted secret; it must decode to exactly 32 bytes
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = hex::decode(s.trim())?;
        if bytes.len() != SECRET_BYTE_SIZE {
            let len = bytes.len();
            bytes.zeroize();
            return Err(CryptoError::InvalidKey(format!(
                "secret must be {} bytes, got {}",
                SECRET_BYTE_SIZE, len
            )));
        }
        let mut arr = [0u8; SECRET_BYTE_SIZE];
        arr.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(arr))
    }

    /// Lowercase hex encoding, as persisted in configuration
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; SECRET_BYTE_SIZE] {
        &self.0
    }

    /// Constant-time check of a hex secret presented by a client
    pub fn matches_hex(&self, presented: &str) -> bool {
        let presented = presented.trim().to_ascii_lowercase();
        let mut expected = self.to_hex();
        let matches = constant_time_eq(expected.as_bytes(), presented.as_bytes());
        expected.zeroize();
        matches
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret(<redacted>)")
    }
}

/// Compare two byte strings without leaking the position of the first difference.
/// Slices of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// `len` random bytes from the OS, hex encoded
pub fn random_hex(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    Ok(hex::encode(bytes))
}
