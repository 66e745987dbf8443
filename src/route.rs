//! Route definitions for the image-articles API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.
//! It creates the Axum router with the application state.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handler::{get_article, health, list_articles, upload, upload_url};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `POST /upload` - Server-proxied upload (multipart field `file`)
/// - `POST /upload-url` - Pre-signed URL for a client-direct upload
/// - `GET /articles` - Paginated article listing (`page`, `pageSize`)
/// - `GET /articles/{id}` - Single article
/// - `GET /health` - Liveness probe
///
/// Every route except `/health` is also served under `/api`.
///
/// # Example Usage
///
/// ```no_run
/// # async fn run(config: image_articles::config::AppConfig) {
/// use image_articles::route::create_app;
/// use image_articles::state::AppState;
///
/// let state = AppState::from_config(config).await.unwrap();
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// # }
/// ```
pub fn create_app(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.upload.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let api_routes = Router::new()
        .route("/upload", post(upload))
        .route("/upload-url", post(upload_url))
        .route("/articles", get(list_articles))
        .route("/articles/{id}", get(get_article));

    Router::new()
        .merge(api_routes.clone())
        .nest("/api", api_routes)
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
