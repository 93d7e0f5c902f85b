//! Gateway configuration
//!
//! Everything persistent lives in one TOML file: the `[server]` settings, the
//! `[auth]` secret and a `[users.<name>]` table per credential. The file holds
//! secrets, so it is always written with owner-only permissions.

use crate::error::ConfigError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stash_core::GatewayLimits;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "stash.toml";

/// Unix permissions for the configuration file
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// Room for multipart framing and small form fields on top of the file itself
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

const CONFIG_HEADER: &str = "# Stash configuration\n\
# This file contains the server secret and password hashes - keep it private!\n\n";

/// Which session artifact the gateway issues
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategyKind {
    /// Signed `{timestamp}.{mac}` tokens, no server-side state
    #[default]
    Stateless,
    /// Random session ids looked up in an in-process table
    Stateful,
}

impl fmt::Display for AuthStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stateless => f.write_str("stateless"),
            Self::Stateful => f.write_str("stateful"),
        }
    }
}

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable authentication
    pub auth_enabled: bool,
    /// Session artifact strategy
    pub auth_strategy: AuthStrategyKind,
    /// Session lifetime (seconds)
    pub session_duration_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Maximum upload size (bytes)
    pub max_upload_size: u64,
    /// Bound on a single backend call (seconds)
    pub backend_timeout_secs: u64,
    /// Interval between expired-session sweeps (seconds)
    pub session_sweep_interval_secs: u64,
    /// Login attempts per second per client address
    pub login_rate_limit_rps: u32,
    /// Answer CORS preflights and tag responses for cross-origin use
    pub cors_enabled: bool,
    /// Directory served under `/static`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    /// Bucket name reported by the object store
    pub bucket: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            auth_enabled: true,
            auth_strategy: AuthStrategyKind::default(),
            session_duration_secs: 12 * 60 * 60, // 12 hours
            secure_cookies: false,
            max_upload_size: stash_core::DEFAULT_MAX_UPLOAD_SIZE,
            backend_timeout_secs: stash_core::DEFAULT_BACKEND_TIMEOUT.as_secs(),
            session_sweep_interval_secs: 5 * 60,
            login_rate_limit_rps: 5,
            cors_enabled: true,
            static_dir: None,
            bucket: "default".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs.max(1))
    }

    /// Ceiling on a whole upload request body
    pub fn upload_body_limit(&self) -> usize {
        usize::try_from(self.max_upload_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
    }

    /// Size and time bounds for the object gateway
    pub fn limits(&self) -> GatewayLimits {
        GatewayLimits {
            max_upload_size: self.max_upload_size,
            backend_timeout: Duration::from_secs(self.backend_timeout_secs),
        }
    }
}

/// `[auth]` section
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Hex-encoded 256-bit server secret; generated on first run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `[users.<name>]` entry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// The whole persisted configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    pub server: GatewayConfig,
    pub auth: AuthSection,
    pub users: BTreeMap<String, UserRecord>,
}

/// Where the configuration is loaded from and saved to
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration, creating a default one if none exists
    async fn load(&self) -> Result<StashConfig, ConfigError>;

    /// Replace the persisted configuration
    async fn save(&self, config: &StashConfig) -> Result<(), ConfigError>;
}

/// TOML file configuration store
#[derive(Clone, Debug)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ConfigStore for TomlConfigStore {
    async fn load(&self) -> Result<StashConfig, ConfigError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = StashConfig::default();
                self.save(&config).await?;
                info!(path = %self.path.display(), "created default configuration");
                Ok(config)
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, config: &StashConfig) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(config)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // Written beside the target, then renamed into place.
        let tmp = self.path.with_extension("toml.tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(CONFIG_FILE_MODE);

        let mut file = options.open(&tmp).await.map_err(|e| self.io_error(e))?;
        file.write_all(CONFIG_HEADER.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(body.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(CONFIG_FILE_MODE))
                .await
                .map_err(|e| self.io_error(e))?;
        }

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// In-memory configuration store for tests
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: parking_lot::Mutex<StashConfig>,
    saves: std::sync::atomic::AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new(config: StashConfig) -> Self {
        Self {
            config: parking_lot::Mutex::new(config),
            saves: Default::default(),
        }
    }

    /// Current contents
    pub fn snapshot(&self) -> StashConfig {
        self.config.lock().clone()
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::Acquire)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<StashConfig, ConfigError> {
        Ok(self.snapshot())
    }

    async fn save(&self, config: &StashConfig) -> Result<(), ConfigError> {
        *self.config.lock() = config.clone();
        self.saves.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("stash.toml");
        let store = TomlConfigStore::new(&path);

        let config = store.load().await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.session_duration_secs, 43_200);
        assert_eq!(config.server.max_upload_size, 32 * 1024 * 1024);
        assert!(config.auth.secret.is_none());
        assert!(config.users.is_empty());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Stash configuration"));
        assert!(text.contains("[server]"));
    }

    #[test]
    fn test_upload_body_limit_leaves_room_for_framing() {
        let config = GatewayConfig {
            max_upload_size: 1024,
            ..Default::default()
        };
        assert_eq!(config.upload_body_limit(), 1024 + 64 * 1024);

        let unbounded = GatewayConfig {
            max_upload_size: u64::MAX,
            ..Default::default()
        };
        assert_eq!(unbounded.upload_body_limit(), usize::MAX);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stash.toml");
        TomlConfigStore::new(&path).load().await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, CONFIG_FILE_MODE);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = TomlConfigStore::new(dir.path().join("stash.toml"));

        let mut config = StashConfig::default();
        config.server.auth_strategy = AuthStrategyKind::Stateful;
        config.server.static_dir = Some(PathBuf::from("web/dist"));
        config.auth.secret = Some("ab".repeat(32));
        config.users.insert(
            "alice".to_string(),
            UserRecord {
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
                is_admin: true,
            },
        );
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.server.auth_strategy, AuthStrategyKind::Stateful);
        assert_eq!(loaded.server.static_dir, Some(PathBuf::from("web/dist")));
        assert_eq!(loaded.auth.secret, config.auth.secret);
        assert_eq!(loaded.users.get("alice"), config.users.get("alice"));
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stash.toml");
        std::fs::write(&path, "[server]\nport = 9999\nauth_strategy = \"stateful\"\n").unwrap();

        let config = TomlConfigStore::new(&path).load().await.unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.auth_strategy, AuthStrategyKind::Stateful);
        assert_eq!(config.server.login_rate_limit_rps, 5);
    }

    #[tokio::test]
    async fn test_unparseable_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stash.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let result = TomlConfigStore::new(&path).load().await;
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = StashConfig::default();
        config.auth.secret = Some("deadbeef".to_string());
        config.users.insert(
            "bob".to_string(),
            UserRecord {
                password_hash: "$argon2id$secret-hash".to_string(),
                is_admin: false,
            },
        );

        let debug = format!("{config:?}");
        assert!(!debug.contains("deadbeef"));
        assert!(!debug.contains("secret-hash"));
    }
}
