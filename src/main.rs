//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Builds the storage and analysis-backend clients
//! - Starts the HTTP server with graceful shutdown support

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use image_articles::config::AppConfig;
use image_articles::route::create_app;
use image_articles::state::AppState;

/// Application entry point
///
/// 1. Loads environment variables from a `.env` file if present
/// 2. Installs the tracing subscriber (`RUST_LOG` overrides the default filter)
/// 3. Parses [`AppConfig`] and builds the shared state
/// 4. Serves the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("image_articles=debug,tower_http=debug")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    let port = config.port;

    tracing::info!(
        storage = ?config.storage_backend,
        storage_base_url = %config.storage_base_url,
        analysis_api_url = %config.analysis_api_url,
        article_lookup = ?config.article_lookup,
        max_upload_bytes = config.upload.max_bytes,
        "Configuration loaded"
    );

    let state = AppState::from_config(config)
        .await
        .expect("Failed to initialize upstream clients");

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind address");

    tracing::info!("Server running at http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// In-flight requests are allowed to finish; an upload already streaming to
/// storage completes or fails on its own.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
