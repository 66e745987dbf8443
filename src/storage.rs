//! Object storage abstraction
//!
//! Uploads are written with a single full-replace PUT at one key. Two
//! implementations exist: [`HttpBucketStorage`] PUTs straight at a publicly
//! writable bucket URL, [`S3Storage`] goes through the AWS SDK and is the only
//! one able to hand out pre-signed write URLs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use thiserror::Error;

use crate::config::S3Config;
use crate::retry::{RetryPolicy, Retryable};

#[derive(Debug, Error)]
pub enum StorageError {
    /// The request never got an answer (connect, timeout, reset)
    #[error("storage unreachable: {0}")]
    Unreachable(String),

    /// Storage answered and refused the write
    #[error("storage rejected upload ({status}): {message}")]
    UploadFailed { status: u16, message: String },

    #[error("could not sign upload URL: {0}")]
    PresignFailed(String),

    #[error("this storage backend cannot issue pre-signed URLs")]
    PresignUnsupported,

    #[error("storage configuration error: {0}")]
    Config(String),
}

impl Retryable for StorageError {
    fn is_transient(&self) -> bool {
        match self {
            StorageError::Unreachable(_) => true,
            StorageError::UploadFailed { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Public URL of `key` under `base_url`.
///
/// The key is percent-encoded, so names kept under the pass-through key policy
/// (spaces, unicode) still produce a valid URL. Generated keys encode to
/// themselves.
pub fn object_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(key)
    )
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes `data` at `key`, replacing any existing object, and returns the
    /// public URL it is readable under.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String>;

    /// Issues a URL that allows a single `PUT` of `content_type` at `key`
    /// until `expires_in` elapses.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Public URL of `key`, whether or not it has been written yet.
    fn public_url(&self, key: &str) -> String;
}

/// Direct PUT against a bucket endpoint that accepts anonymous writes
pub struct HttpBucketStorage {
    client: reqwest::Client,
    bucket_url: String,
    retry: RetryPolicy,
}

impl HttpBucketStorage {
    pub fn new(client: reqwest::Client, bucket_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            bucket_url: bucket_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    async fn put_once(&self, url: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(StorageError::UploadFailed {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpBucketStorage {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let url = self.public_url(key);
        let size = data.len();
        let start = Instant::now();

        self.retry
            .run("storage.put", || self.put_once(&url, content_type, data.clone()))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bucket upload failed"
                );
            })?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bucket upload successful"
        );
        Ok(url)
    }

    async fn presign_put(
        &self,
        _key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::PresignUnsupported)
    }

    fn public_url(&self, key: &str) -> String {
        object_url(&self.bucket_url, key)
    }
}

/// S3 storage through the AWS SDK
///
/// Region and credentials come from the [`S3Config`] handed to
/// [`S3Storage::new`]; when no static keys are configured the SDK's default
/// provider chain is used.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
    retry: RetryPolicy,
}

impl S3Storage {
    pub async fn new(
        config: &S3Config,
        public_base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> StorageResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                loader = loader.credentials_provider(Credentials::new(
                    key_id.clone(),
                    secret.clone(),
                    None,
                    None,
                    "image-articles",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::Config(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".into(),
                ))
            }
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            // Path-style addressing for MinIO and friends
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn put_once(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| match e.raw_response().map(|r| r.status().as_u16()) {
                Some(status) => StorageError::UploadFailed {
                    status,
                    message: DisplayErrorContext(&e).to_string(),
                },
                None => StorageError::Unreachable(DisplayErrorContext(&e).to_string()),
            })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let size = data.len();
        let start = Instant::now();

        self.retry
            .run("storage.put", || self.put_once(key, content_type, data.clone()))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );
        Ok(self.public_url(key))
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::PresignFailed(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            expires_in_secs = expires_in.as_secs(),
            "Issued pre-signed upload URL"
        );
        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        object_url(&self.public_base_url, key)
    }
}
