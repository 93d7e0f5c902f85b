//! Error types and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stash_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

use crate::responses::ErrorResponse;

/// Reasons a login or session artifact is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed session token")]
    Malformed,

    #[error("session token signature mismatch")]
    BadSignature,

    #[error("session expired")]
    Expired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session not found")]
    NotFound,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("session could not be created: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Malformed | Self::BadSignature | Self::Expired | Self::NotFound => {
                "invalid or expired session".to_string()
            }
            Self::InvalidCredentials => "invalid credentials".to_string(),
            Self::MissingField(field) => format!("missing field: {field}"),
            Self::Unavailable(_) => "internal server error".to_string(),
        }
    }
}

/// Failures loading or persisting the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid server secret: {0}")]
    InvalidSecret(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] stash_crypto::CryptoError),
}

/// Failures creating or updating a credential
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("password must be at least {min} characters")]
    Weak { min: usize },

    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("password hashing failed: {0}")]
    Hash(#[from] stash_crypto::CryptoError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("too many requests")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => e.status_code(),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(e) => match e {
                CoreError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                CoreError::UploadAborted { .. } => StatusCode::BAD_REQUEST,
                CoreError::BackendWrite { .. }
                | CoreError::BackendRead { .. }
                | CoreError::InvalidKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Short name of the error kind, for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::TooManyRequests => "rate_limited",
            Self::Internal(_) => "internal",
            Self::Core(e) => e.kind(),
        }
    }

    /// Message safe to show a client; never carries backend or crypto detail
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Unauthorized => "authentication required".to_string(),
            Self::Auth(e) => e.public_message(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::PayloadTooLarge { limit } => format!("upload exceeds {limit} bytes"),
            Self::TooManyRequests => "too many requests, slow down".to_string(),
            Self::Internal(_) => "internal server error".to_string(),
            Self::Core(e) => match e {
                CoreError::ObjectNotFound { .. } => "object not found".to_string(),
                CoreError::PayloadTooLarge { limit } => format!("upload exceeds {limit} bytes"),
                CoreError::UploadAborted { .. } => "upload aborted".to_string(),
                CoreError::BackendWrite { .. } => "failed to store object".to_string(),
                CoreError::BackendRead { .. } => "storage backend unavailable".to_string(),
                CoreError::InvalidKey(_) => "internal server error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "request rejected");
        }

        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::Auth(AuthError::Expired), StatusCode::UNAUTHORIZED)]
    #[case(ApiError::Auth(AuthError::MissingField("token")), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Core(CoreError::ObjectNotFound { key: "k".into() }), StatusCode::NOT_FOUND)]
    #[case(ApiError::Core(CoreError::PayloadTooLarge { limit: 1 }), StatusCode::PAYLOAD_TOO_LARGE)]
    #[case(ApiError::Core(CoreError::BackendRead { reason: "x".into() }), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ApiError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS)]
    fn test_status_mapping(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn test_public_message_hides_backend_detail() {
        let error = ApiError::Core(CoreError::BackendWrite {
            key: "1_a".into(),
            reason: "nats: connection refused at 10.0.0.7".into(),
        });
        let message = error.public_message();
        assert!(!message.contains("10.0.0.7"));
        assert!(!message.contains("nats"));
    }

    #[test]
    fn test_token_failures_share_one_message() {
        let messages: Vec<_> = [AuthError::Malformed, AuthError::BadSignature, AuthError::Expired]
            .iter()
            .map(|e| ApiError::Auth(e.clone()).public_message())
            .collect();
        assert!(messages.iter().all(|m| m == &messages[0]));
    }
}
