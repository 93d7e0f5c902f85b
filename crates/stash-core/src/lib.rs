//! # Stash Core
//!
//! The object pipeline that sits between the HTTP gateway and the storage
//! backend.
//!
//! This crate provides:
//! - **Key Addressing**: safe storage keys derived from untrusted client names
//! - **Object References**: the metadata view handed back to clients
//! - **Object Gateway**: upload/list/fetch/remove orchestration with size and
//!   time bounds on every backend call
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! ├─────────────────────────────────────────┤
//! │             ObjectGateway               │
//! ├────────────────────┬────────────────────┤
//! │   Key Addressing   │  StoredObjectRef   │
//! ├────────────────────┴────────────────────┤
//! │           ObjectStore (backend)         │
//! └─────────────────────────────────────────┘
//! ```

pub mod error;
pub mod gateway;
pub mod keys;
pub mod metadata;

pub use error::{CoreError, Result, SizeLimitExceeded};
pub use gateway::{GatewayLimits, ObjectGateway, DEFAULT_BACKEND_TIMEOUT, DEFAULT_MAX_UPLOAD_SIZE};
pub use keys::{is_valid_key, make_key, sanitize};
pub use metadata::StoredObjectRef;

pub use stash_store::{ByteStream, ObjectStore, StoreStatus};
