//! JSON response bodies

use serde::Serialize;
use stash_core::{StoreStatus, StoredObjectRef};

const SUCCESS: &str = "success";
const ERROR: &str = "error";

/// `{status, message}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: SUCCESS,
            message: message.into(),
        }
    }
}

/// Error envelope rendered by [`crate::ApiError`]
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
        }
    }
}

/// Result of `POST /api/upload`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub key: String,
    pub size: u64,
    pub filename: String,
}

impl From<StoredObjectRef> for UploadResponse {
    fn from(object: StoredObjectRef) -> Self {
        Self {
            status: SUCCESS,
            key: object.key,
            size: object.size,
            filename: object.original_name,
        }
    }
}

/// One row of `GET /api/list`
#[derive(Debug, Serialize)]
pub struct ObjectEntry {
    pub name: String,
    pub size: u64,
    /// RFC 3339 commit time
    pub created: String,
    pub original_name: String,
    pub content_type: Option<String>,
}

impl From<StoredObjectRef> for ObjectEntry {
    fn from(object: StoredObjectRef) -> Self {
        Self {
            name: object.key,
            size: object.size,
            created: object.created_at.to_rfc3339(),
            original_name: object.original_name,
            content_type: object.content_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub status: &'static str,
    pub objects: Vec<ObjectEntry>,
}

impl ListResponse {
    pub fn new(objects: Vec<StoredObjectRef>) -> Self {
        Self {
            status: SUCCESS,
            objects: objects.into_iter().map(ObjectEntry::from).collect(),
        }
    }
}

/// Result of `GET /api/status`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub bucket: String,
    pub objects: u64,
    pub bytes: u64,
    pub persistent: bool,
}

impl From<StoreStatus> for StatusResponse {
    fn from(status: StoreStatus) -> Self {
        Self {
            status: SUCCESS,
            bucket: status.bucket,
            objects: status.objects,
            bytes: status.bytes,
            persistent: status.persistent,
        }
    }
}
