//! Environment configuration
//!
//! Every tunable of the service is read once at startup into [`AppConfig`].
//! Nothing here is process-global: the struct is handed to the components
//! that need it (storage, backend client, handlers).

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::keygen::KeyPolicy;
use crate::retry::RetryPolicy;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted when `ALLOWED_MIME_TYPES` is not set.
pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// How `GET /articles/{id}` resolves an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleLookup {
    /// Ask the backend for the record by id.
    Direct,
    /// Fetch the full collection and match on the resolved id.
    /// Breaks when the backend reorders records between requests.
    Positional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    /// Plain PUT against a publicly writable bucket URL.
    Http,
    /// AWS S3 (or a compatible endpoint) through the SDK.
    S3,
}

/// Upload constraints shared by the validator and both upload routes.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Explicit S3 settings, passed to [`crate::storage::S3Storage::new`].
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Public base URL objects are readable under, e.g. `https://bucket.s3.amazonaws.com`
    pub storage_base_url: String,
    /// Base URL of the analysis backend
    pub analysis_api_url: String,
    pub article_lookup: ArticleLookup,
    pub storage_backend: StorageBackendKind,
    pub s3: Option<S3Config>,
    pub upload: UploadLimits,
    pub key_policy: KeyPolicy,
    pub presign_expiry: Duration,
    pub upstream_timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", 8080u16)?;

        let storage_base_url = get("STORAGE_BASE_URL")
            .ok_or(ConfigError::Missing("STORAGE_BASE_URL"))?
            .trim_end_matches('/')
            .to_string();
        let analysis_api_url = get("ANALYSIS_API_URL")
            .ok_or(ConfigError::Missing("ANALYSIS_API_URL"))?
            .trim_end_matches('/')
            .to_string();

        let article_lookup = match get("ARTICLE_LOOKUP").as_deref().map(str::to_lowercase) {
            None => ArticleLookup::Direct,
            Some(v) if v == "direct" => ArticleLookup::Direct,
            Some(v) if v == "positional" => ArticleLookup::Positional,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "ARTICLE_LOOKUP",
                    value: v,
                })
            }
        };

        let storage_backend = match get("STORAGE_BACKEND").as_deref().map(str::to_lowercase) {
            None => StorageBackendKind::Http,
            Some(v) if v == "http" => StorageBackendKind::Http,
            Some(v) if v == "s3" => StorageBackendKind::S3,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: v,
                })
            }
        };

        let s3 = match storage_backend {
            StorageBackendKind::Http => None,
            StorageBackendKind::S3 => Some(S3Config {
                bucket: get("S3_BUCKET").ok_or(ConfigError::Missing("S3_BUCKET"))?,
                region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: get("AWS_ACCESS_KEY_ID"),
                secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
                endpoint_url: get("S3_ENDPOINT_URL"),
            }),
        };

        let allowed_mime_types = match get("ALLOWED_MIME_TYPES") {
            Some(list) => list
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => UploadLimits::default().allowed_mime_types,
        };
        let upload = UploadLimits {
            max_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_mime_types,
        };

        let key_policy = match get("UPLOAD_KEY_POLICY").as_deref().map(str::to_lowercase) {
            None => KeyPolicy::Generated,
            Some(v) if v == "generated" => KeyPolicy::Generated,
            Some(v) if v == "original" => KeyPolicy::Original,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "UPLOAD_KEY_POLICY",
                    value: v,
                })
            }
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&get, "RETRY_MAX_ATTEMPTS", retry_defaults.max_attempts)?,
            initial_backoff: Duration::from_millis(parse_or(
                &get,
                "RETRY_INITIAL_BACKOFF_MS",
                retry_defaults.initial_backoff.as_millis() as u64,
            )?),
            ..retry_defaults
        };

        Ok(Self {
            port,
            storage_base_url,
            analysis_api_url,
            article_lookup,
            storage_backend,
            s3,
            upload,
            key_policy,
            presign_expiry: Duration::from_secs(parse_or(&get, "PRESIGN_EXPIRY_SECS", 60u64)?),
            upstream_timeout: Duration::from_secs(parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 10u64)?),
            retry,
        })
    }

    /// Convenience for tests: the same parsing over a fixed map.
    pub fn from_map(vars: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
