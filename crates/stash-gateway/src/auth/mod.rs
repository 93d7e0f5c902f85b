//! Authentication
//!
//! Two interchangeable strategies sit behind [`Authenticator`]: signed
//! stateless tokens exchanged for the shared secret, and server-side sessions
//! opened with a username and password. Either way the client ends up holding
//! one opaque artifact, carried in the `stash_session` cookie or an
//! `Authorization: Bearer` header.

pub mod session;
pub mod token;

pub use session::{spawn_sweeper, Session, SessionAuthenticator, SessionTable};
pub use token::TokenAuthenticator;

use crate::config::{AuthStrategyKind, GatewayConfig};
use crate::credentials::CredentialStore;
use crate::error::AuthError;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Session cookie name
pub const SESSION_COOKIE: &str = "stash_session";

/// Who a request is acting as
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    /// Holder of the shared server secret
    SecretHolder,
    /// A user with a server-side session
    User { username: String },
    /// Authentication is disabled
    Anonymous,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretHolder => f.write_str("secret-holder"),
            Self::User { username } => f.write_str(username),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Body of `POST /api/auth/login`
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingField(field))
}

/// A successful login
pub struct LoginGrant {
    /// Opaque value for the session cookie or bearer header
    pub artifact: String,
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// The configured authentication strategy
pub enum Authenticator {
    Stateless(TokenAuthenticator),
    Stateful(SessionAuthenticator),
}

impl Authenticator {
    /// Build the strategy named by `config.auth_strategy`
    pub fn from_config(config: &GatewayConfig, credentials: Arc<CredentialStore>) -> Self {
        let duration = config.session_duration();
        match config.auth_strategy {
            AuthStrategyKind::Stateless => {
                Self::Stateless(TokenAuthenticator::new(credentials, duration))
            }
            AuthStrategyKind::Stateful => {
                Self::Stateful(SessionAuthenticator::new(credentials, duration))
            }
        }
    }

    pub fn strategy(&self) -> AuthStrategyKind {
        match self {
            Self::Stateless(_) => AuthStrategyKind::Stateless,
            Self::Stateful(_) => AuthStrategyKind::Stateful,
        }
    }

    pub fn session_duration(&self) -> Duration {
        match self {
            Self::Stateless(tokens) => tokens.session_duration(),
            Self::Stateful(sessions) => sessions.session_duration(),
        }
    }

    /// Exchange login credentials for a session artifact
    pub async fn login(&self, request: &LoginRequest, now: DateTime<Utc>) -> Result<LoginGrant, AuthError> {
        match self {
            Self::Stateless(tokens) => {
                let presented = required(&request.token, "token")?;
                if !tokens.check_secret(presented) {
                    return Err(AuthError::InvalidCredentials);
                }

                let lifetime = chrono::Duration::from_std(tokens.session_duration())
                    .unwrap_or(chrono::Duration::MAX);
                Ok(LoginGrant {
                    artifact: tokens.issue_at(now.timestamp()),
                    principal: Principal::SecretHolder,
                    expires_at: now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC),
                })
            }
            Self::Stateful(sessions) => {
                let username = required(&request.username, "username")?;
                let password = required(&request.password, "password")?;

                let session = sessions.authenticate_at(username, password, now).await?;
                Ok(LoginGrant {
                    artifact: session.id,
                    principal: Principal::User {
                        username: session.username,
                    },
                    expires_at: session.expires_at,
                })
            }
        }
    }

    /// Resolve an artifact to the principal it proves
    pub fn validate(&self, artifact: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        match self {
            Self::Stateless(tokens) => {
                tokens.validate_at(artifact, now.timestamp())?;
                Ok(Principal::SecretHolder)
            }
            Self::Stateful(sessions) => {
                let username = sessions.validate_at(artifact, now)?;
                Ok(Principal::User { username })
            }
        }
    }

    /// End a session. Stateless tokens cannot be revoked; they simply expire.
    pub fn revoke(&self, artifact: &str) {
        if let Self::Stateful(sessions) = self {
            sessions.revoke(artifact);
        }
    }

    /// The session table, for the stateful strategy
    pub fn sessions(&self) -> Option<&Arc<SessionTable>> {
        match self {
            Self::Stateless(_) => None,
            Self::Stateful(sessions) => Some(sessions.sessions()),
        }
    }
}

/// Cookie carrying a freshly issued artifact
pub fn session_cookie(artifact: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
    Cookie::build((SESSION_COOKIE, artifact))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Cookie that makes the browser forget the session
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The artifact a request presents: session cookie first, then bearer header
pub fn session_artifact(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string)
}
