//! Object operation handlers

use crate::responses::{ListResponse, MessageResponse, UploadResponse};
use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use stash_core::keys::FALLBACK_NAME;
use stash_core::SizeLimitExceeded;
use std::sync::Arc;
use tracing::debug;

/// Multipart field holding the uploaded content
const FILE_FIELD: &str = "file";
/// Optional multipart field describing what was pasted (`text`, `url`, ...)
const TYPE_FIELD: &str = "type";

/// Name used when the client sends content without a file name
pub fn default_filename(kind: Option<&str>) -> &'static str {
    match kind {
        Some("text") => "text.txt",
        Some("url") => "url.txt",
        _ => FALLBACK_NAME,
    }
}

fn multipart_error(e: MultipartError, limit: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::BadRequest(format!("invalid multipart body: {}", e.body_text()))
    }
}

fn stream_error(e: MultipartError, limit: u64) -> std::io::Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SizeLimitExceeded { limit }.into_io()
    } else {
        std::io::Error::other(e.body_text())
    }
}

/// Declared `Content-Length`, if present and numeric
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// POST /api/upload - Stream the `file` field to the object store
pub async fn upload_object(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let limit = state.gateway.limits().max_upload_size;

    // Refused before a single byte is read
    if declared_length(&headers).is_some_and(|len| len > state.config.upload_body_limit() as u64) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(TYPE_FIELD) => {
                kind = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
            }
            Some(FILE_FIELD) => {
                let content_type = field.content_type().map(str::to_owned);
                let filename = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| default_filename(kind.as_deref()).to_owned());

                let data = field.map_err(move |e| stream_error(e, limit)).boxed();
                let stored = state
                    .gateway
                    .upload(data, &filename, content_type.as_deref())
                    .await?;

                return Ok(Json(stored.into()));
            }
            other => {
                debug!(field = ?other, "ignoring multipart field");
            }
        }
    }

    Err(ApiError::BadRequest(format!("missing `{FILE_FIELD}` field")))
}

/// GET /api/list - Enumerate stored objects
pub async fn list_objects(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>, ApiError> {
    let objects = state.gateway.list().await?;
    Ok(Json(ListResponse::new(objects)))
}

/// GET /api/download/{key} - Object bytes as an attachment
pub async fn download_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let (object, data) = state.gateway.fetch(&key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(object.size));
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    // Keys are restricted to [A-Za-z0-9._-], always a valid header value.
    if let Ok(disposition) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", object.key)) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((headers, Body::from_stream(data)).into_response())
}

/// DELETE /api/delete/{key} - Remove an object
pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.gateway.remove(&key).await?;
    Ok(Json(MessageResponse::success("object deleted")))
}

/// Download or delete without a key
pub async fn missing_key() -> ApiError {
    ApiError::BadRequest("missing object key".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("41943040"), Some(40 * 1024 * 1024))]
    #[case(Some("0"), Some(0))]
    #[case(Some("lots"), None)]
    #[case(None, None)]
    fn test_declared_length(#[case] value: Option<&'static str>, #[case] expected: Option<u64>) {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static(value));
        }
        assert_eq!(declared_length(&headers), expected);
    }

    #[rstest]
    #[case(Some("text"), "text.txt")]
    #[case(Some("url"), "url.txt")]
    #[case(Some("image"), "unnamed_file")]
    #[case(None, "unnamed_file")]
    fn test_default_filename(#[case] kind: Option<&str>, #[case] expected: &str) {
        assert_eq!(default_filename(kind), expected);
    }
}
