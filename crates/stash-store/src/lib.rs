//! # Stash Store
//!
//! Object storage backend interface for the Stash gateway.
//!
//! The gateway never persists object data itself. Everything durable lives
//! behind the [`ObjectStore`] trait, which a deployment satisfies with its
//! storage service of choice. This crate ships the trait, the metadata types
//! that cross it, and [`MemoryObjectStore`] for tests and development.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              ObjectGateway              │
//! ├─────────────────────────────────────────┤
//! │           ObjectStore Trait             │
//! ├────────────────────┬────────────────────┤
//! │ MemoryObjectStore  │  external backend  │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Commit semantics
//!
//! `put` consumes a byte stream. Implementations must only make the object
//! visible to `get`/`list` once the whole stream has been received; if the
//! stream yields an error (client disconnect, size limit) nothing is stored.

pub mod error;
pub mod memory;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryObjectStore;
pub use types::{ObjectInfo, ObjectMeta, StoreStatus};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// A stream of object content chunks
pub type ByteStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`, replacing any existing object
    async fn put(&self, key: &str, meta: ObjectMeta, data: ByteStream<'_>) -> Result<ObjectInfo>;

    /// Retrieve an object's metadata and content
    async fn get(&self, key: &str) -> Result<(ObjectInfo, ByteStream<'static>)>;

    /// Retrieve an object's metadata without its content
    async fn info(&self, key: &str) -> Result<ObjectInfo>;

    /// Delete an object. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List metadata for every stored object, in backend order
    async fn list(&self) -> Result<Vec<ObjectInfo>>;

    /// Backend status summary
    async fn status(&self) -> Result<StoreStatus>;
}
