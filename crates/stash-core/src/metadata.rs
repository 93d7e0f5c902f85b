//! Object reference metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stash_store::{ObjectInfo, ObjectMeta};

/// Backend metadata entry holding the client's original file name
pub const ORIGINAL_NAME_KEY: &str = "original-name";

/// What the gateway knows about a stored object.
///
/// The key is assigned once at upload time and never changes. The backend
/// owns the key to blob mapping; this is only a view of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObjectRef {
    pub key: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredObjectRef {
    /// Build from backend info, falling back to the key when the original
    /// name was never recorded
    pub fn from_info(info: &ObjectInfo) -> Self {
        let original_name = info
            .user_metadata
            .get(ORIGINAL_NAME_KEY)
            .cloned()
            .unwrap_or_else(|| info.key.clone());

        Self {
            key: info.key.clone(),
            original_name,
            size: info.size,
            content_type: info.content_type.clone(),
            created_at: info.created_at,
        }
    }
}

impl From<ObjectInfo> for StoredObjectRef {
    fn from(info: ObjectInfo) -> Self {
        Self::from_info(&info)
    }
}

/// Backend metadata recorded for an upload
pub(crate) fn upload_meta(original_name: &str, content_type: Option<&str>) -> ObjectMeta {
    let meta = ObjectMeta::new().with_user_metadata(ORIGINAL_NAME_KEY, original_name);
    match content_type {
        Some(ct) => meta.with_content_type(ct),
        None => meta,
    }
}
