//! Server-side sessions
//!
//! Sessions live in a process-wide table behind a reader/writer lock: request
//! validation takes the shared lock, create/revoke/sweep take the exclusive
//! one. Expired entries are dropped lazily on lookup and by a periodic sweep.

use crate::credentials::CredentialStore;
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use stash_crypto::random_hex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Session id length in random bytes (256 bits)
pub const SESSION_ID_BYTES: usize = 32;

/// A logged-in user's session
#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &"<redacted>")
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session id to session map
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.sessions.write().insert(session.id.clone(), session);
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().remove(id)
    }

    /// Remove `id` only if it is still expired at `now`
    pub fn remove_if_expired(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get(id) {
            Some(session) if session.is_expired_at(now) => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Drop every session with `expires_at < now`; returns how many went
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at >= now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// Removal of an expired session, off the caller's path when a runtime exists
fn schedule_removal(table: &Arc<SessionTable>, id: &str, now: DateTime<Utc>) {
    let table = Arc::clone(table);
    let id = id.to_owned();
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                table.remove_if_expired(&id, now);
            });
        }
        Err(_) => {
            table.remove_if_expired(&id, now);
        }
    }
}

/// Username/password login backed by a [`SessionTable`]
pub struct SessionAuthenticator {
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionTable>,
    session_duration: Duration,
}

impl SessionAuthenticator {
    pub fn new(credentials: Arc<CredentialStore>, session_duration: Duration) -> Self {
        Self {
            credentials,
            sessions: Arc::new(SessionTable::new()),
            session_duration,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    /// Verify a password and open a session starting at `now`
    pub async fn authenticate_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let credential = self
            .credentials
            .verify(username, password)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let id = random_hex(SESSION_ID_BYTES).map_err(|e| AuthError::Unavailable(e.to_string()))?;
        let lifetime = chrono::Duration::from_std(self.session_duration)
            .unwrap_or(chrono::Duration::MAX);
        let session = Session {
            id,
            username: credential.username,
            created_at: now,
            expires_at: now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.sessions.insert(session.clone());
        Ok(session)
    }

    /// Username owning `id`, if the session is live at `now`
    pub fn validate_at(&self, id: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let session = self.sessions.get(id).ok_or(AuthError::NotFound)?;

        if session.is_expired_at(now) {
            schedule_removal(&self.sessions, id, now);
            return Err(AuthError::Expired);
        }

        Ok(session.username)
    }

    /// Drop a session; unknown ids are ignored
    pub fn revoke(&self, id: &str) {
        if let Some(session) = self.sessions.remove(id) {
            debug!(username = %session.username, "session revoked");
        }
    }
}

/// Periodically sweep `table` until `shutdown` fires or its sender is dropped
pub fn spawn_sweeper(
    table: Arc<SessionTable>,
    every: Duration,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = table.sweep(Utc::now());
                    if removed > 0 {
                        debug!(removed, remaining = table.len(), "swept expired sessions");
                    }
                }
                _ = shutdown.changed() => {
                    debug!("session sweeper stopping");
                    return;
                }
            }
        }
    })
}
