//! Shared application state
//!
//! Built once at startup and cloned into every handler. Holds only immutable
//! configuration and thread-safe handles to the two upstream services.

use std::sync::Arc;

use crate::backend::{AnalysisBackend, HttpAnalysisBackend};
use crate::config::{AppConfig, StorageBackendKind};
use crate::normalizer::ArticleService;
use crate::storage::{HttpBucketStorage, ObjectStorage, S3Storage, StorageError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ObjectStorage>,
    pub articles: ArticleService,
}

impl AppState {
    /// Wires explicit storage and backend implementations; used by `main` via
    /// [`AppState::from_config`] and directly by tests with fakes.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStorage>,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let articles = ArticleService::new(
            backend,
            config.storage_base_url.clone(),
            config.article_lookup,
        );
        Self {
            config: Arc::new(config),
            storage,
            articles,
        }
    }

    /// Builds the real HTTP/S3 clients described by `config`.
    pub async fn from_config(config: AppConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let storage: Arc<dyn ObjectStorage> = match (config.storage_backend, &config.s3) {
            (StorageBackendKind::S3, Some(s3)) => Arc::new(
                S3Storage::new(s3, config.storage_base_url.clone(), config.retry).await?,
            ),
            (StorageBackendKind::S3, None) => {
                return Err(StorageError::Config("S3 backend selected without S3 settings".into()))
            }
            (StorageBackendKind::Http, _) => Arc::new(HttpBucketStorage::new(
                http.clone(),
                config.storage_base_url.clone(),
                config.retry,
            )),
        };

        let backend = Arc::new(HttpAnalysisBackend::new(
            http,
            config.analysis_api_url.clone(),
            config.retry,
        ));

        Ok(Self::new(config, storage, backend))
    }
}
