//! Client for the image-analysis backend
//!
//! The backend owns analysis records: `GET {base}/articles` returns the whole
//! collection, `GET {base}/articles/{id}` a single record where supported.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::RawAnalysisRecord;
use crate::retry::{RetryPolicy, Retryable};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("analysis backend unreachable: {0}")]
    Unreachable(String),

    #[error("analysis backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analysis backend sent an unreadable payload: {0}")]
    Decode(String),

    #[error("record not found")]
    NotFound,
}

impl Retryable for BackendError {
    fn is_transient(&self) -> bool {
        match self {
            BackendError::Unreachable(_) => true,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            BackendError::Decode(_) | BackendError::NotFound => false,
        }
    }
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Every record, in the backend's own order.
    async fn list_records(&self) -> Result<Vec<RawAnalysisRecord>, BackendError>;

    /// A single record by backend id; `BackendError::NotFound` when absent.
    async fn find_record(&self, id: &str) -> Result<RawAnalysisRecord, BackendError>;
}

/// Collection payloads seen in the wild: a bare array, or a scan result
/// wrapping it. Records stay raw JSON so each one is decoded on its own.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(alias = "Items", alias = "articles")]
        items: Vec<Value>,
    },
}

/// Decodes every record that is a JSON object; anything else is skipped.
fn decode_records(items: Vec<Value>) -> Vec<RawAnalysisRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                tracing::warn!(index, "Skipping analysis record that is not an object");
                return None;
            }
            serde_json::from_value::<RawAnalysisRecord>(item)
                .inspect_err(|e| {
                    tracing::warn!(index, error = %e, "Skipping unreadable analysis record");
                })
                .ok()
        })
        .collect()
}

/// Unwraps a single-record payload.
///
/// A get-item result carries the record under `Item`; without it (or with a
/// body that names neither `id` nor `image_id`) there is no record.
fn decode_record(payload: Value) -> Result<RawAnalysisRecord, BackendError> {
    let body = match payload {
        Value::Object(mut map) => match map.remove("Item").or_else(|| map.remove("item")) {
            Some(item) => item,
            None => Value::Object(map),
        },
        other => other,
    };
    if !body.is_object() {
        return Err(BackendError::NotFound);
    }

    let record: RawAnalysisRecord =
        serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    if record.is_identified() {
        Ok(record)
    } else {
        Err(BackendError::NotFound)
    }
}

pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpAnalysisBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, BackendError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn list_records(&self) -> Result<Vec<RawAnalysisRecord>, BackendError> {
        let url = format!("{}/articles", self.base_url);

        let payload: ListPayload = self
            .retry
            .run("backend.list", || self.get_json::<ListPayload>(&url))
            .await
            .map_err(|e| match e {
                // The collection endpoint itself missing is a deployment fault.
                BackendError::NotFound => BackendError::Status {
                    status: 404,
                    body: format!("{url} not found"),
                },
                other => other,
            })?;

        let records = match payload {
            ListPayload::Bare(items) | ListPayload::Wrapped { items } => decode_records(items),
        };
        tracing::debug!(count = records.len(), "Fetched analysis records");
        Ok(records)
    }

    async fn find_record(&self, id: &str) -> Result<RawAnalysisRecord, BackendError> {
        let url = format!("{}/articles/{}", self.base_url, urlencoding::encode(id));

        let payload = self
            .retry
            .run("backend.get", || self.get_json::<Value>(&url))
            .await?;

        decode_record(payload)
    }
}
