//! Credential store
//!
//! Holds the server secret and the username to credential mapping, both
//! sourced from the persisted configuration. Updates are written back through
//! the [`ConfigStore`] before they become visible in memory.

use crate::config::{ConfigStore, UserRecord};
use crate::error::{ConfigError, CredentialError};
use parking_lot::RwLock;
use stash_crypto::password::{burn_verification, hash_password, verify_password, MIN_PASSWORD_LEN};
use stash_crypto::ServerSecret;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};
use zeroize::Zeroizing;

const MAX_USERNAME_LEN: usize = 64;

/// A stored user credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl Credential {
    fn from_record(username: &str, record: &UserRecord) -> Self {
        Self {
            username: username.to_string(),
            password_hash: record.password_hash.clone(),
            is_admin: record.is_admin,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

fn validate_username(username: &str) -> Result<(), CredentialError> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'));

    if valid {
        Ok(())
    } else {
        Err(CredentialError::InvalidUsername(username.to_string()))
    }
}

/// Server secret plus per-user password hashes
pub struct CredentialStore {
    config: Arc<dyn ConfigStore>,
    secret: RwLock<ServerSecret>,
    users: RwLock<BTreeMap<String, UserRecord>>,
    // Serializes read-modify-write cycles against the config store.
    write_lock: tokio::sync::Mutex<()>,
}

impl CredentialStore {
    /// Load credentials, generating and persisting a server secret on first run
    pub async fn load(config: Arc<dyn ConfigStore>) -> Result<Self, ConfigError> {
        let mut file = config.load().await?;

        let secret = match file.auth.secret.as_deref() {
            Some(hex) => ServerSecret::from_hex(hex)
                .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?,
            None => {
                let secret = ServerSecret::generate()?;
                file.auth.secret = Some(secret.to_hex());
                config.save(&file).await?;
                info!("generated new server secret");
                secret
            }
        };

        Ok(Self {
            config,
            secret: RwLock::new(secret),
            users: RwLock::new(file.users),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Current server secret
    pub fn secret(&self) -> ServerSecret {
        self.secret.read().clone()
    }

    pub fn get_credential(&self, username: &str) -> Option<Credential> {
        self.users
            .read()
            .get(username)
            .map(|record| Credential::from_record(username, record))
    }

    /// All credentials, ordered by username
    pub fn list_users(&self) -> Vec<Credential> {
        self.users
            .read()
            .iter()
            .map(|(name, record)| Credential::from_record(name, record))
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Create or overwrite a credential and persist it
    pub async fn set_credential(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<Credential, CredentialError> {
        validate_username(username)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::Weak {
                min: MIN_PASSWORD_LEN,
            });
        }

        let password = Zeroizing::new(password.to_owned());
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CredentialError::Hash(stash_crypto::CryptoError::PasswordHash(e.to_string())))??;

        let record = UserRecord {
            password_hash,
            is_admin,
        };

        let _guard = self.write_lock.lock().await;
        let mut file = self.config.load().await?;
        file.users.insert(username.to_string(), record.clone());
        self.config.save(&file).await?;

        let credential = Credential::from_record(username, &record);
        self.users.write().insert(username.to_string(), record);
        info!(username = %username, is_admin, "credential stored");

        Ok(credential)
    }

    /// Check a password. Unknown users still pay for one hash verification.
    pub async fn verify(&self, username: &str, password: &str) -> Option<Credential> {
        let credential = self.get_credential(username);
        let hash = credential.as_ref().map(|c| c.password_hash.clone());
        let password = Zeroizing::new(password.to_owned());

        let verified = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => verify_password(&hash, &password),
            None => {
                burn_verification(&password);
                false
            }
        })
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "password verification task failed");
            false
        });

        if verified {
            credential
        } else {
            None
        }
    }

    /// Replace the server secret; every outstanding stateless token stops validating
    pub async fn rotate_secret(&self) -> Result<(), ConfigError> {
        let fresh = ServerSecret::generate()?;

        let _guard = self.write_lock.lock().await;
        let mut file = self.config.load().await?;
        file.auth.secret = Some(fresh.to_hex());
        self.config.save(&file).await?;

        *self.secret.write() = fresh;
        info!("server secret rotated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfigStore, StashConfig};
    use rstest::rstest;

    async fn store_with(config: StashConfig) -> (Arc<MemoryConfigStore>, CredentialStore) {
        let backing = Arc::new(MemoryConfigStore::new(config));
        let store = CredentialStore::load(backing.clone()).await.unwrap();
        (backing, store)
    }

    #[tokio::test]
    async fn test_first_load_generates_and_persists_secret() {
        let (backing, store) = store_with(StashConfig::default()).await;

        let persisted = backing.snapshot().auth.secret.unwrap();
        assert_eq!(persisted.len(), 64);
        assert_eq!(store.secret().to_hex(), persisted);
        assert_eq!(backing.save_count(), 1);
    }

    #[tokio::test]
    async fn test_existing_secret_is_kept() {
        let mut config = StashConfig::default();
        config.auth.secret = Some("11".repeat(32));
        let (backing, store) = store_with(config).await;

        assert_eq!(store.secret().to_hex(), "11".repeat(32));
        assert_eq!(backing.save_count(), 0);
    }

    #[rstest]
    #[case("not-hex-at-all")]
    #[case("abcd")]
    #[tokio::test]
    async fn test_bad_secret_is_configuration_error(#[case] secret: &str) {
        let mut config = StashConfig::default();
        config.auth.secret = Some(secret.to_string());
        let backing = Arc::new(MemoryConfigStore::new(config));

        let result = CredentialStore::load(backing).await;
        assert!(matches!(result, Err(ConfigError::InvalidSecret(_))));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let (backing, store) = store_with(StashConfig::default()).await;

        let result = store.set_credential("alice", "short", false).await;
        assert!(matches!(result, Err(CredentialError::Weak { min: 8 })));
        assert!(backing.snapshot().users.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("semi;colon")]
    #[tokio::test]
    async fn test_invalid_username_rejected(#[case] username: &str) {
        let (_, store) = store_with(StashConfig::default()).await;

        let result = store.set_credential(username, "long enough", false).await;
        assert!(matches!(result, Err(CredentialError::InvalidUsername(_))));
    }

    #[tokio::test]
    async fn test_set_then_verify() {
        let (backing, store) = store_with(StashConfig::default()).await;

        let credential = store.set_credential("alice", "correct horse", true).await.unwrap();
        assert!(credential.is_admin);
        assert_ne!(credential.password_hash, "correct horse");

        let persisted = backing.snapshot();
        assert_eq!(persisted.users["alice"].password_hash, credential.password_hash);

        assert_eq!(store.verify("alice", "correct horse").await, Some(credential));
        assert_eq!(store.verify("alice", "wrong horse").await, None);
        assert_eq!(store.verify("mallory", "correct horse").await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_, store) = store_with(StashConfig::default()).await;

        store.set_credential("alice", "first password", true).await.unwrap();
        store.set_credential("alice", "second password", false).await.unwrap();

        assert_eq!(store.user_count(), 1);
        assert!(!store.get_credential("alice").unwrap().is_admin);
        assert!(store.verify("alice", "first password").await.is_none());
        assert!(store.verify("alice", "second password").await.is_some());
    }

    #[tokio::test]
    async fn test_rotate_secret() {
        let (backing, store) = store_with(StashConfig::default()).await;
        let before = store.secret().to_hex();

        store.rotate_secret().await.unwrap();

        let after = store.secret().to_hex();
        assert_ne!(before, after);
        assert_eq!(backing.snapshot().auth.secret.unwrap(), after);
    }

    #[tokio::test]
    async fn test_set_credential_keeps_other_sections() {
        let mut config = StashConfig::default();
        config.server.port = 4242;
        let (backing, store) = store_with(config).await;

        store.set_credential("bob", "password123", false).await.unwrap();

        let persisted = backing.snapshot();
        assert_eq!(persisted.server.port, 4242);
        assert!(persisted.auth.secret.is_some());
    }
}
