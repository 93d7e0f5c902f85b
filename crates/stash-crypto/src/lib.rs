//! # Stash Crypto
//!
//! Cryptographic primitives for the Stash object gateway.
//!
//! This crate provides:
//! - **Server secret**: 256-bit random secret, hex encoded for persistence
//! - **MAC**: BLAKE3 keyed hashing for stateless session tokens
//! - **Passwords**: Argon2id salted hashes for per-user credentials
//! - **Random identifiers**: OS-sourced random hex strings for session IDs
//!
//! ## Example
//!
//! ```rust,ignore
//! use stash_crypto::{mac, ServerSecret};
//!
//! let secret = ServerSecret::generate()?;
//! let tag = mac::sign(&secret, b"1700000000");
//! mac::verify(&secret, b"1700000000", &tag.to_hex())?;
//! ```

pub mod error;
pub mod mac;
pub mod password;
pub mod secret;

pub use error::{CryptoError, Result};
pub use mac::Tag;
pub use secret::{constant_time_eq, random_hex, ServerSecret};

/// Size of the server secret in bytes (256 bits)
pub const SECRET_BYTE_SIZE: usize = 32;
