//! In-memory object store for testing and development

use crate::{ByteStream, ObjectInfo, ObjectMeta, ObjectStore, Result, StoreError, StoreStatus};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use dashmap::DashMap;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;

#[derive(Clone)]
struct StoredObject {
    info: ObjectInfo,
    data: Bytes,
}

/// An in-memory object store
#[derive(Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<DashMap<String, StoredObject>>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create a new empty store with the default bucket name
    pub fn new() -> Self {
        Self::with_bucket("default")
    }

    /// Create a new empty store reporting the given bucket name
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Get the number of objects stored
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Remove every object
    pub fn clear(&self) {
        self.objects.clear();
    }

    /// Get total size of all objects
    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|entry| entry.value().info.size).sum()
    }

    /// List all keys
    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, meta: ObjectMeta, mut data: ByteStream<'_>) -> Result<ObjectInfo> {
        let mut buf = BytesMut::new();
        let mut hasher = blake3::Hasher::new();

        // Nothing is inserted until the stream has been fully drained.
        while let Some(chunk) = data.try_next().await.map_err(|e| StoreError::Aborted {
            key: key.to_string(),
            reason: e.to_string(),
        })? {
            hasher.update(&chunk);
            buf.extend_from_slice(&chunk);
        }

        let data = buf.freeze();
        let info = ObjectInfo {
            key: key.to_string(),
            size: data.len() as u64,
            digest: hasher.finalize().to_hex().to_string(),
            content_type: meta.content_type,
            user_metadata: meta.user_metadata,
            created_at: Utc::now(),
        };

        self.objects.insert(
            key.to_string(),
            StoredObject {
                info: info.clone(),
                data,
            },
        );
        tracing::trace!(key = %key, size = info.size, "object committed");

        Ok(info)
    }

    async fn get(&self, key: &str) -> Result<(ObjectInfo, ByteStream<'static>)> {
        let object = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let data = object.data;
        Ok((object.info, stream::once(async move { Ok(data) }).boxed()))
    }

    async fn info(&self, key: &str) -> Result<ObjectInfo> {
        self.objects
            .get(key)
            .map(|entry| entry.value().info.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        Ok(self
            .objects
            .iter()
            .map(|entry| entry.value().info.clone())
            .collect())
    }

    async fn status(&self) -> Result<StoreStatus> {
        Ok(StoreStatus {
            bucket: self.bucket.clone(),
            objects: self.objects.len() as u64,
            bytes: self.total_size(),
            persistent: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(data: &'static [u8]) -> ByteStream<'static> {
        stream::once(async move { Ok(Bytes::from_static(data)) }).boxed()
    }

    async fn read_all(mut data: ByteStream<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = data.try_next().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryObjectStore::new();
        let meta = ObjectMeta::new()
            .with_content_type("text/plain")
            .with_user_metadata("original-name", "hello.txt");

        let info = store.put("1_hello.txt", meta, body(b"Hello, World!")).await.unwrap();
        assert_eq!(info.size, 13);
        assert_eq!(info.digest, blake3::hash(b"Hello, World!").to_hex().to_string());

        let (fetched, data) = store.get("1_hello.txt").await.unwrap();
        assert_eq!(fetched, info);
        assert_eq!(fetched.user_metadata.get("original-name").unwrap(), "hello.txt");
        assert_eq!(read_all(data).await, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_memory_store_multi_chunk() {
        let store = MemoryObjectStore::new();
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"")),
            Ok(Bytes::from_static(b"def")),
        ])
        .boxed();

        let info = store.put("k", ObjectMeta::new(), chunks).await.unwrap();
        assert_eq!(info.size, 6);

        let (_, data) = store.get("k").await.unwrap();
        assert_eq!(read_all(data).await, b"abcdef");
    }

    #[tokio::test]
    async fn test_memory_store_not_found() {
        let store = MemoryObjectStore::new();

        assert!(matches!(store.get("missing").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.info("missing").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_memory_store_delete_twice() {
        let store = MemoryObjectStore::new();
        store.put("k", ObjectMeta::new(), body(b"data")).await.unwrap();

        store.delete("k").await.unwrap();
        let second = store.delete("k").await;
        assert!(matches!(second, Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_stream_is_not_committed() {
        let store = MemoryObjectStore::new();
        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("client went away")),
        ])
        .boxed();

        let result = store.put("k", ObjectMeta::new(), broken).await;
        assert!(matches!(result, Err(StoreError::Aborted { .. })));
        assert!(store.is_empty());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryObjectStore::new();
        store.put("k", ObjectMeta::new(), body(b"one")).await.unwrap();
        store.put("k", ObjectMeta::new(), body(b"three")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.info("k").await.unwrap().size, 5);
    }

    #[tokio::test]
    async fn test_list_and_status() {
        let store = MemoryObjectStore::with_bucket("files");
        store.put("a", ObjectMeta::new(), body(b"12")).await.unwrap();
        store.put("b", ObjectMeta::new(), body(b"345")).await.unwrap();

        let mut keys: Vec<_> = store.list().await.unwrap().into_iter().map(|i| i.key).collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        let status = store.status().await.unwrap();
        assert_eq!(status.bucket, "files");
        assert_eq!(status.objects, 2);
        assert_eq!(status.bytes, 5);
        assert!(!status.persistent);
    }
}
