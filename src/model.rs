//! Data models for the image-articles service
//!
//! This module defines the wire shapes of the HTTP API, the raw records the
//! analysis backend returns, and the normalized article models handed to the
//! presentation layer.

use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::pagination::PageLink;

/// One uploaded file, alive only for the duration of a request
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Response returned after a server-proxied upload
///
/// # Example
/// ```json
/// {
///   "success": true,
///   "message": "File uploaded successfully",
///   "fileUrl": "https://bucket.s3.amazonaws.com/image_3f1c...e9.jpg",
///   "key": "image_3f1c...e9.jpg"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file_url: String,
    pub key: String,
}

/// Request payload for a pre-signed upload URL
///
/// # Example
/// ```json
/// { "filename": "cat.png", "filetype": "image/png", "filesize": 52311 }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct UploadUrlRequest {
    pub filename: Option<String>,
    pub filetype: Option<String>,

    /// Optional declared size; validated against the ceiling when present
    pub filesize: Option<u64>,
}

/// Pre-signed write URL for a single key and content type
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// URL the client must `PUT` the raw bytes to
    pub url: String,

    /// Key the object will be stored under
    pub key: String,

    /// Where the object is readable once the client's PUT has completed
    pub file_url: String,

    /// Seconds until `url` stops being accepted
    pub expires_in: u64,
}

/// Article identifier as exposed to clients
///
/// Either the backend's own id (a UUID string in practice, but numbers are
/// accepted) or, for records without one, the 1-based position in the
/// backend's listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArticleId {
    Number(u64),
    Text(String),
}

impl ArticleId {
    /// Compares against an id taken from a URL path.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            ArticleId::Number(n) => raw.trim().parse::<u64>().is_ok_and(|r| r == *n),
            ArticleId::Text(s) => s == raw,
        }
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleId::Number(n) => write!(f, "{n}"),
            ArticleId::Text(s) => f.write_str(s),
        }
    }
}

/// One analysis record as stored by the backend
///
/// Any field may be missing while the image is still being processed. A field
/// holding the wrong JSON type is dropped to `None` so one bad record cannot
/// fail a whole listing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawAnalysisRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ArticleId>,

    /// Storage key of the analysed image
    #[serde(default, deserialize_with = "lenient")]
    pub image_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,

    /// Generated article body
    #[serde(default, deserialize_with = "lenient")]
    pub article: Option<String>,

    #[serde(default, rename = "DetectedLabels", deserialize_with = "lenient")]
    pub detected_labels: Option<Vec<String>>,

    /// ISO-8601 datetime, with or without an offset
    #[serde(default, rename = "Timestamp", deserialize_with = "lenient")]
    pub timestamp: Option<String>,
}

impl RawAnalysisRecord {
    /// Whether the record carries anything that identifies an analysis.
    pub fn is_identified(&self) -> bool {
        self.id.is_some() || self.image_id.is_some()
    }
}

/// Decodes an optional field, treating `null` and ill-typed values as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }

    match serde_json::from_value::<T>(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                expected = std::any::type_name::<T>(),
                "Ignoring malformed record field"
            );
            Ok(None)
        }
    }
}

/// Query-string number where an empty value (`?page=`) means "not given".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Article summary shown in listings; every field is always populated
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListItem {
    pub id: ArticleId,
    pub title: String,
    pub date: String,
    pub image_url: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Full article shown on the detail page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleItem {
    pub id: ArticleId,
    pub title: String,
    pub date: String,
    pub image_url: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Query parameters for listing articles
///
/// # Example
/// Query string: `?page=2&pageSize=3`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Page number, starts from 1
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<usize>,

    /// Articles per page; omitted means everything on one page
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page_size: Option<usize>,
}

/// Paginated article listing
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleListItem>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_numbers: Vec<PageLink>,
}

#[derive(Serialize, Debug)]
pub struct ArticleResponse {
    pub article: ArticleItem,
}
