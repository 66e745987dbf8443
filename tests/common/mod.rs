//! Shared fakes and helpers for the router-level tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;

use image_articles::backend::{AnalysisBackend, BackendError};
use image_articles::config::AppConfig;
use image_articles::model::RawAnalysisRecord;
use image_articles::route::create_app;
use image_articles::state::AppState;
use image_articles::storage::{object_url, ObjectStorage, StorageError, StorageResult};

pub const STORAGE_BASE: &str = "https://uploads.example-bucket.com";
pub const BOUNDARY: &str = "X-IMAGE-ARTICLES-TEST-BOUNDARY";

/// Records every write instead of talking to a bucket
#[derive(Default)]
pub struct FakeStorage {
    pub puts: Mutex<Vec<(String, String, usize)>>,
    pub presigns: AtomicUsize,
    /// When set, every write fails with this status
    pub reject_with: Option<u16>,
    pub presign_fails: bool,
}

impl FakeStorage {
    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn network_calls(&self) -> usize {
        self.put_count() + self.presigns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        if let Some(status) = self.reject_with {
            return Err(StorageError::UploadFailed {
                status,
                message: "SlowDown".to_string(),
            });
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string(), data.len()));
        Ok(self.public_url(key))
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.presigns.fetch_add(1, Ordering::SeqCst);
        if self.presign_fails {
            return Err(StorageError::PresignFailed("no credentials".to_string()));
        }
        Ok(format!(
            "{}?X-Amz-Expires={}&content-type={}",
            self.public_url(key),
            expires_in.as_secs(),
            content_type
        ))
    }

    fn public_url(&self, key: &str) -> String {
        object_url(STORAGE_BASE, key)
    }
}

/// Serves a fixed record list
#[derive(Default)]
pub struct FakeBackend {
    pub records: Mutex<Vec<RawAnalysisRecord>>,
    pub unavailable: bool,
    pub list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_records(records: Vec<RawAnalysisRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn list_records(&self) -> Result<Vec<RawAnalysisRecord>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn find_record(&self, id: &str) -> Result<RawAnalysisRecord, BackendError> {
        if self.unavailable {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_ref().is_some_and(|rid| rid.matches(id)))
            .cloned()
            .ok_or(BackendError::NotFound)
    }
}

pub fn test_config(overrides: &[(&'static str, &'static str)]) -> AppConfig {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("STORAGE_BASE_URL", STORAGE_BASE),
        ("ANALYSIS_API_URL", "http://analysis.invalid"),
        ("RETRY_MAX_ATTEMPTS", "1"),
    ]);
    vars.extend(overrides.iter().copied());
    AppConfig::from_map(&vars).expect("valid test config")
}

/// Router wired to the given fakes
pub fn setup_test_app(
    overrides: &[(&'static str, &'static str)],
    storage: Arc<FakeStorage>,
    backend: Arc<FakeBackend>,
) -> axum::Router {
    let state = AppState::new(test_config(overrides), storage, backend);
    create_app(state)
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Single-part multipart body; returns (content-type header, body)
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
