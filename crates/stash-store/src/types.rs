//! Metadata types exchanged with storage backends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata supplied by the caller when storing an object
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Content type (MIME type)
    pub content_type: Option<String>,
    /// Free-form metadata headers stored alongside the object
    #[serde(default)]
    pub user_metadata: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a user metadata entry
    pub fn with_user_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_metadata.insert(key.into(), value.into());
        self
    }
}

/// Metadata for a stored object, as reported by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// BLAKE3 digest of the content, hex encoded
    pub digest: String,
    /// Content type (MIME type)
    pub content_type: Option<String>,
    /// User metadata given at put time
    #[serde(default)]
    pub user_metadata: BTreeMap<String, String>,
    /// Commit timestamp
    pub created_at: DateTime<Utc>,
}

/// Backend status summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatus {
    /// Bucket or namespace name
    pub bucket: String,
    /// Number of stored objects
    pub objects: u64,
    /// Total stored bytes
    pub bytes: u64,
    /// Whether data survives a process restart
    pub persistent: bool,
}
