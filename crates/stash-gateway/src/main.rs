//! Stash Gateway - authenticated object upload/download server

use clap::Parser;
use stash_core::ObjectStore;
use stash_gateway::config::DEFAULT_CONFIG_FILE;
use stash_gateway::{run_server, AuthStrategyKind, ConfigStore, CredentialStore, TomlConfigStore};
use stash_store::MemoryObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stash-gateway")]
#[command(about = "Authenticated upload/download gateway for a Stash object store")]
#[command(version)]
struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "STASH_CONFIG")]
    config: PathBuf,

    /// Host to bind to (overrides the config file)
    #[arg(short = 'H', long, env = "STASH_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "STASH_PORT")]
    port: Option<u16>,

    /// Session strategy (overrides the config file)
    #[arg(long, value_enum, env = "STASH_AUTH_STRATEGY")]
    auth_strategy: Option<AuthStrategyKind>,

    /// Disable authentication (for development only!)
    #[arg(long, env = "STASH_NO_AUTH")]
    no_auth: bool,

    /// Enable debug logging
    #[arg(short, long, env = "STASH_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "STASH_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("stash_gateway={log_level},stash_core={log_level},tower_http=debug").into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config_store = Arc::new(TomlConfigStore::new(&args.config));
    let mut config = config_store.load().await?.server;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(strategy) = args.auth_strategy {
        config.auth_strategy = strategy;
    }
    if args.no_auth {
        config.auth_enabled = false;
    }

    let credentials = Arc::new(CredentialStore::load(config_store.clone()).await?);

    tracing::info!(
        "Starting Stash Gateway on {} (config: {})",
        config.bind_addr(),
        config_store.path().display()
    );

    if !config.auth_enabled {
        tracing::warn!("⚠️  Authentication is DISABLED - for development only!");
    } else if config.auth_strategy == AuthStrategyKind::Stateful && credentials.user_count() == 0 {
        tracing::warn!(
            "⚠️  Stateful sessions enabled but no users exist - add one with `stash-admin set-user`"
        );
    }

    let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::with_bucket(config.bucket.clone()));

    // Run the server
    run_server(config, store, credentials).await
}
