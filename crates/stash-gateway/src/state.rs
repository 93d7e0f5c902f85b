//! Application state

use crate::auth::Authenticator;
use crate::config::GatewayConfig;
use crate::credentials::CredentialStore;
use crate::middleware::{create_rate_limiter, KeyedRateLimiter};
use stash_core::{ObjectGateway, ObjectStore};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Object pipeline in front of the backend
    pub gateway: Arc<ObjectGateway>,
    /// Configured authentication strategy
    pub auth: Authenticator,
    /// Server secret and user credentials
    pub credentials: Arc<CredentialStore>,
    /// Per-client throttle on login attempts
    pub login_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ObjectStore>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let gateway = Arc::new(ObjectGateway::new(store, config.limits()));
        let auth = Authenticator::from_config(&config, Arc::clone(&credentials));
        let login_limiter = create_rate_limiter(config.login_rate_limit_rps);

        Self {
            config,
            gateway,
            auth,
            credentials,
            login_limiter,
        }
    }
}
