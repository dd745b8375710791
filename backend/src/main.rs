//! Voting Service
//!
//! A REST API for yes/no polls backed by an SQLite poll store.
//! Also serves the static landing and voting pages.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use voting_service::config::Config;
use voting_service::polls::SqlitePollStore;
use voting_service::server;
use voting_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    if config.auth.admin_key.is_none() {
        warn!("ADMIN_KEY is not set, poll creation is disabled");
    }

    let store = SqlitePollStore::connect_with_fallback(
        &config.store.database_url,
        config.store.fallback_database_url.as_deref(),
        config.store.max_connections,
    )
    .await
    .map_err(|e| anyhow::anyhow!("No poll store available: {}", e))?;

    let state = AppState::new(Arc::new(store), config.auth.admin_key.clone());
    let app = server::app(state, &config.server.static_dir);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
