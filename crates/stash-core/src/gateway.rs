//! Object gateway
//!
//! The only component that talks to the storage backend. Uploads are counted
//! against a size ceiling while they stream, keys come from
//! [`crate::keys`], and every backend call is bounded by a timeout. Backend
//! failures are surfaced as-is; nothing is retried.

use crate::error::{CoreError, Result, SizeLimitExceeded};
use crate::keys::{is_valid_key, make_key_at};
use crate::metadata::{upload_meta, StoredObjectRef};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use stash_store::{ByteStream, ObjectStore, StoreError, StoreStatus};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default upload ceiling (32 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 32 * 1024 * 1024;

/// Default bound on a single backend call
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(300);

/// Size and time bounds applied by the gateway
#[derive(Clone, Debug)]
pub struct GatewayLimits {
    pub max_upload_size: u64,
    pub backend_timeout: Duration,
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

/// Orchestrates object operations against an injected backend
pub struct ObjectGateway {
    store: Arc<dyn ObjectStore>,
    limits: GatewayLimits,
    last_second: AtomicI64,
}

impl ObjectGateway {
    pub fn new(store: Arc<dyn ObjectStore>, limits: GatewayLimits) -> Self {
        Self {
            store,
            limits,
            last_second: AtomicI64::new(0),
        }
    }

    pub fn limits(&self) -> &GatewayLimits {
        &self.limits
    }

    /// Clock reading for key generation, never earlier than a previous one
    fn key_second(&self, now: DateTime<Utc>) -> i64 {
        let secs = now.timestamp();
        let prev = self.last_second.fetch_max(secs, Ordering::AcqRel);
        prev.max(secs)
    }

    /// Stream an upload to the backend under a freshly generated key
    pub async fn upload(
        &self,
        data: ByteStream<'_>,
        original_name: &str,
        content_type: Option<&str>,
    ) -> Result<StoredObjectRef> {
        self.upload_at(data, original_name, content_type, Utc::now())
            .await
    }

    /// [`Self::upload`] with an explicit clock reading
    pub async fn upload_at(
        &self,
        data: ByteStream<'_>,
        original_name: &str,
        content_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<StoredObjectRef> {
        let key = make_key_at(original_name, self.key_second(now));
        if !is_valid_key(&key) {
            return Err(CoreError::InvalidKey(key));
        }

        let limit = self.limits.max_upload_size;
        let exceeded = AtomicBool::new(false);
        let tripped = &exceeded;
        let mut received: u64 = 0;

        let limited = data
            .map(move |chunk| {
                let chunk = chunk.inspect_err(|e| {
                    if SizeLimitExceeded::is_cause_of(e) {
                        tripped.store(true, Ordering::Release);
                    }
                })?;
                received += chunk.len() as u64;
                if received > limit {
                    tripped.store(true, Ordering::Release);
                    return Err(SizeLimitExceeded { limit }.into_io());
                }
                Ok(chunk)
            })
            .boxed();

        let meta = upload_meta(original_name, content_type);
        let outcome = timeout(self.limits.backend_timeout, self.store.put(&key, meta, limited)).await;

        let info = match outcome {
            Ok(Ok(info)) => info,
            Ok(Err(_)) if exceeded.load(Ordering::Acquire) => {
                debug!(key = %key, limit, "upload exceeded size limit");
                return Err(CoreError::PayloadTooLarge { limit });
            }
            Ok(Err(StoreError::Aborted { reason, .. })) => {
                debug!(key = %key, reason = %reason, "upload stream ended early");
                return Err(CoreError::UploadAborted { key, reason });
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "backend put failed");
                return Err(CoreError::BackendWrite {
                    key,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(key = %key, "backend put timed out");
                return Err(CoreError::BackendWrite {
                    key,
                    reason: "timed out".to_string(),
                });
            }
        };

        info!(key = %info.key, size = info.size, "object stored");
        Ok(StoredObjectRef::from_info(&info))
    }

    /// Every stored object, in backend order
    pub async fn list(&self) -> Result<Vec<StoredObjectRef>> {
        let objects = match timeout(self.limits.backend_timeout, self.store.list()).await {
            Ok(Ok(objects)) => objects,
            Ok(Err(e)) => return Err(read_error(e)),
            Err(_) => return Err(read_timeout()),
        };

        Ok(objects.iter().map(StoredObjectRef::from_info).collect())
    }

    /// Object metadata and content
    pub async fn fetch(&self, key: &str) -> Result<(StoredObjectRef, ByteStream<'static>)> {
        if !is_valid_key(key) {
            return Err(not_found(key));
        }

        match timeout(self.limits.backend_timeout, self.store.get(key)).await {
            Ok(Ok((info, data))) => Ok((StoredObjectRef::from_info(&info), data)),
            Ok(Err(e)) if e.is_not_found() => Err(not_found(key)),
            Ok(Err(e)) => Err(read_error(e)),
            Err(_) => Err(read_timeout()),
        }
    }

    /// Delete an object; a missing key is `ObjectNotFound`
    pub async fn remove(&self, key: &str) -> Result<()> {
        if !is_valid_key(key) {
            return Err(not_found(key));
        }

        match timeout(self.limits.backend_timeout, self.store.delete(key)).await {
            Ok(Ok(())) => {
                info!(key = %key, "object deleted");
                Ok(())
            }
            Ok(Err(e)) if e.is_not_found() => Err(not_found(key)),
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "backend delete failed");
                Err(CoreError::BackendWrite {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => Err(CoreError::BackendWrite {
                key: key.to_string(),
                reason: "timed out".to_string(),
            }),
        }
    }

    /// Backend status passthrough
    pub async fn status(&self) -> Result<StoreStatus> {
        match timeout(self.limits.backend_timeout, self.store.status()).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(read_error(e)),
            Err(_) => Err(read_timeout()),
        }
    }
}

fn not_found(key: &str) -> CoreError {
    CoreError::ObjectNotFound {
        key: key.to_string(),
    }
}

fn read_error(e: StoreError) -> CoreError {
    warn!(error = %e, "backend read failed");
    CoreError::BackendRead {
        reason: e.to_string(),
    }
}

fn read_timeout() -> CoreError {
    warn!("backend read timed out");
    CoreError::BackendRead {
        reason: "timed out".to_string(),
    }
}
