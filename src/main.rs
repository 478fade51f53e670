//! Agent Chat Backend
//!
//! A web chat server that relays user messages to a remote conversational
//! agent and keeps each user's conversation threads.

use agent_chat::agent::HttpAgentClient;
use agent_chat::api;
use agent_chat::config::Config;
use agent_chat::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    if !config.auth.admin_email_set || !config.auth.admin_password_set {
        warn!("ADMIN_EMAIL or ADMIN_PASSWORD not set, using the default admin account");
    }

    let client = HttpAgentClient::new(config.agent.endpoint.clone(), config.agent.timeout_secs)?;

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!(data_dir = %config.persistence.data_dir.display(), "Using data directory");
    let app_state = Arc::new(AppState::new(config, Arc::new(client)));
    if !app_state.bridge.is_configured() {
        warn!("Agent identifiers not configured, chat replies will be degraded");
    }
    let app = api::router(app_state);

    info!("🚀 Server running on http://{}", addr);
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
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
