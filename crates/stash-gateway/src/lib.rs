//! # Stash Gateway
//!
//! Authenticated HTTP gateway in front of a Stash object store.
//!
//! This crate provides:
//! - **Object API**: upload, list, download and delete over JSON/multipart
//! - **Authentication**: signed stateless tokens or server-side sessions
//! - **Credential Store**: server secret and password hashes kept in the
//!   persisted TOML configuration
//! - **Rate Limiting**: per-client throttling of login attempts
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │             Browsers / curl / scripts               │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                   Stash Gateway                     │
//! ├─────────────────────────────────────────────────────┤
//! │   CORS preflight │ Auth gate │ Login rate limiter   │
//! ├─────────────────────────────────────────────────────┤
//! │   Handlers (upload, list, download, delete, ...)    │
//! ├─────────────────────────────────────────────────────┤
//! │                    stash-core                       │
//! │          (key addressing, ObjectGateway)            │
//! ├─────────────────────────────────────────────────────┤
//! │                    stash-store                      │
//! │               (ObjectStore backend)                 │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{Authenticator, Principal};
pub use config::{AuthStrategyKind, ConfigStore, GatewayConfig, MemoryConfigStore, StashConfig, TomlConfigStore};
pub use credentials::{Credential, CredentialStore};
pub use error::{ApiError, AuthError, ConfigError, CredentialError};
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
