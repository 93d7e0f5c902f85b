//! Server startup and lifecycle

use crate::auth::spawn_sweeper;
use crate::credentials::CredentialStore;
use crate::middleware::{spawn_limiter_pruner, LIMITER_PRUNE_INTERVAL};
use crate::{routes, AppState, GatewayConfig};
use stash_core::ObjectStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Run the gateway server until ctrl-c
pub async fn run_server(
    config: GatewayConfig,
    store: Arc<dyn ObjectStore>,
    credentials: Arc<CredentialStore>,
) -> anyhow::Result<()> {
    run_server_with_shutdown(config, store, credentials, shutdown_signal()).await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    store: Arc<dyn ObjectStore>,
    credentials: Arc<CredentialStore>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), store, credentials));

    match state.gateway.status().await {
        Ok(status) => {
            info!(
                bucket = %status.bucket,
                objects = status.objects,
                bytes = status.bytes,
                "Object store status"
            );
            if !status.persistent {
                warn!("⚠ Storage mode: In-memory (NOT persistent - for development only)");
            }
        }
        Err(e) => warn!(error = %e, "Object store status unavailable"),
    }

    // Expired-session sweep, stateful strategy only
    let (stop_sweeper, sweeper_stopped) = watch::channel(());
    let sweeper = state
        .auth
        .sessions()
        .map(|table| spawn_sweeper(Arc::clone(table), config.sweep_interval(), sweeper_stopped.clone()));
    let pruner = spawn_limiter_pruner(
        Arc::clone(&state.login_limiter),
        LIMITER_PRUNE_INTERVAL,
        sweeper_stopped,
    );

    let app = routes::create_router(Arc::clone(&state));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 Stash Gateway listening on http://{}", listener.local_addr()?);
    info!(strategy = %state.auth.strategy(), "📦 Object API ready for requests");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    let _ = stop_sweeper.send(());
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!(error = %e, "session sweeper ended abnormally");
        }
    }
    if let Err(e) = pruner.await {
        warn!(error = %e, "limiter pruner ended abnormally");
    }

    info!("👋 Gateway shutdown complete");

    Ok(())
}

/// Resolves on ctrl-c
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for ctrl-c"),
    }
}
