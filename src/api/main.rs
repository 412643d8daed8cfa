use anyhow::Context;
use tracing::info;

use portfolio_api::config::AppConfig;
use portfolio_api::middleware::observability::{init_tracing, install_panic_hook};
use portfolio_api::routes::{AppState, create_app};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(config.log_format);
    install_panic_hook();

    let addr = config.socket_addr();
    info!(
        enrichment = config.enrichment_enabled(),
        default_provider = config.default_provider.as_str(),
        adaptive_limit = config.adaptive_rate_limit.max_requests(),
        contact_limit = config.contact_rate_limit.max_requests(),
        "Application starting..."
    );

    let app = create_app(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", addr))?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM (Docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
