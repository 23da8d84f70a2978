pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Startup error: {0}")]
    Core(#[from] core_state::CoreError),

    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
}

/// Run the API server until Ctrl+C or SIGTERM.
pub async fn run() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::Config::from_env()?;
    let addr = config.bind_address();
    if config.require_auth {
        tracing::info!("Bearer sessions required on data routes");
    }

    let core = Arc::new(core_state::CoreState::new(config)?);
    let mut server = api::start_api_server(core, addr).await?;

    shutdown_signal().await;
    server.shutdown();
    server.wait().await;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
