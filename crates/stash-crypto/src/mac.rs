//! Message authentication using BLAKE3 in keyed mode
//!
//! Tags are transported as lowercase hex. Verification compares the hex
//! encodings in constant time, so any alteration of the transported
//! signature (including case changes) is rejected.

use crate::secret::{constant_time_eq, ServerSecret};
use crate::{CryptoError, Result};

/// A MAC tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag(blake3::Hash);

impl Tag {
    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// Raw tag bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

/// Compute the MAC of `message` under `secret`
pub fn sign(secret: &ServerSecret, message: &[u8]) -> Tag {
    Tag(blake3::keyed_hash(secret.as_bytes(), message))
}

/// Check a hex-encoded signature against `message`
pub fn verify(secret: &ServerSecret, message: &[u8], signature_hex: &str) -> Result<()> {
    let expected = sign(secret, message).to_hex();
    if constant_time_eq(expected.as_bytes(), signature_hex.as_bytes()) {
        Ok(())
    } else {
        Err(CryptoError::SignatureVerification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECRET_BYTE_SIZE;

    fn secret() -> ServerSecret {
        ServerSecret::from_bytes([42u8; SECRET_BYTE_SIZE])
    }

    #[test]
    fn test_sign_is_deterministic() {
        let s = secret();
        assert_eq!(sign(&s, b"1700000000"), sign(&s, b"1700000000"));
        assert_ne!(sign(&s, b"1700000000"), sign(&s, b"1700000001"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let s = secret();
        let tag = sign(&s, b"payload");
        assert!(verify(&s, b"payload", &tag.to_hex()).is_ok());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let tag = sign(&secret(), b"payload");
        let other = ServerSecret::from_bytes([1u8; SECRET_BYTE_SIZE]);
        assert!(matches!(
            verify(&other, b"payload", &tag.to_hex()),
            Err(CryptoError::SignatureVerification)
        ));
    }

    #[test]
    fn test_verify_rejects_every_bit_flip() {
        let s = secret();
        let sig = sign(&s, b"1700000000").to_hex();
        let bytes = sig.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut flipped = bytes.to_vec();
                flipped[i] ^= 1 << bit;
                let candidate = String::from_utf8_lossy(&flipped);
                assert!(
                    verify(&s, b"1700000000", &candidate).is_err(),
                    "flip of bit {} in byte {} accepted",
                    bit,
                    i
                );
            }
        }
    }

    #[test]
    fn test_verify_rejects_truncated() {
        let s = secret();
        let sig = sign(&s, b"x").to_hex();
        assert!(verify(&s, b"x", &sig[..sig.len() - 2]).is_err());
        assert!(verify(&s, b"x", "").is_err());
    }
}
