//! Article normalization
//!
//! Turns raw, possibly half-finished analysis records into fully populated
//! [`ArticleListItem`]s and [`ArticleItem`]s. Missing data is replaced by
//! defaults and logged; it never fails a request.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::backend::{AnalysisBackend, BackendError};
use crate::config::ArticleLookup;
use crate::model::{ArticleId, ArticleItem, ArticleListItem, RawAnalysisRecord};
use crate::storage::object_url;

pub const UNTITLED: &str = "Untitled Article";
pub const NO_SUMMARY: &str = "No summary available yet.";
pub const NO_CONTENT: &str = "This article is still being generated.";
/// Served in place of an image for records without an `image_id`
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";
/// Characters of the article body used when the backend has no summary
pub const SUMMARY_LENGTH: usize = 100;

/// Fields shared by the list and detail shapes.
struct Common {
    id: ArticleId,
    title: String,
    date: String,
    image_url: String,
    tags: Vec<String>,
}

/// Backend id when present, otherwise the 1-based position in the listing.
///
/// The positional fallback only holds as long as the backend keeps returning
/// records in the same order.
pub fn resolve_id(record: &RawAnalysisRecord, position: usize) -> ArticleId {
    record
        .id
        .clone()
        .unwrap_or(ArticleId::Number(position as u64))
}

pub fn resolve_title(record: &RawAnalysisRecord) -> String {
    match (non_blank(&record.title), non_blank(&record.image_id)) {
        (Some(title), _) => title.to_string(),
        (None, Some(image_id)) => format!("Analysis of {image_id}"),
        (None, None) => UNTITLED.to_string(),
    }
}

pub fn resolve_summary(record: &RawAnalysisRecord) -> String {
    if let Some(summary) = non_blank(&record.summary) {
        return summary.to_string();
    }
    match non_blank(&record.article) {
        Some(body) => excerpt(body, SUMMARY_LENGTH),
        None => NO_SUMMARY.to_string(),
    }
}

pub fn resolve_content(record: &RawAnalysisRecord) -> String {
    non_blank(&record.article).unwrap_or(NO_CONTENT).to_string()
}

pub fn resolve_image_url(record: &RawAnalysisRecord, storage_base_url: &str) -> String {
    match non_blank(&record.image_id) {
        Some(image_id) => object_url(storage_base_url, image_id),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Formats the record's timestamp as e.g. "January 5, 2025".
///
/// Absent or unparseable timestamps fall back to `today`. The fallback is a
/// data-quality problem of the record, so it is logged rather than hidden.
pub fn resolve_date(record: &RawAnalysisRecord, today: NaiveDate) -> String {
    let date = match non_blank(&record.timestamp) {
        Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
            tracing::warn!(
                image_id = record.image_id.as_deref().unwrap_or("-"),
                timestamp = raw,
                "Malformed timestamp, using current date"
            );
            today
        }),
        None => {
            tracing::debug!(
                image_id = record.image_id.as_deref().unwrap_or("-"),
                "Record has no timestamp, using current date"
            );
            today
        }
    };
    format_date(date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Accepts RFC 3339 as well as the offset-less ISO form Python's
/// `datetime.isoformat()` produces, and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn common(
    record: &RawAnalysisRecord,
    id: ArticleId,
    storage_base_url: &str,
    today: NaiveDate,
) -> Common {
    Common {
        id,
        title: resolve_title(record),
        date: resolve_date(record, today),
        image_url: resolve_image_url(record, storage_base_url),
        tags: record.detected_labels.clone().unwrap_or_default(),
    }
}

pub fn to_list_item(
    record: &RawAnalysisRecord,
    position: usize,
    storage_base_url: &str,
    today: NaiveDate,
) -> ArticleListItem {
    let c = common(record, resolve_id(record, position), storage_base_url, today);
    ArticleListItem {
        id: c.id,
        title: c.title,
        date: c.date,
        image_url: c.image_url,
        summary: resolve_summary(record),
        tags: c.tags,
    }
}

pub fn to_article_item(
    record: &RawAnalysisRecord,
    id: ArticleId,
    storage_base_url: &str,
    today: NaiveDate,
) -> ArticleItem {
    let c = common(record, id, storage_base_url, today);
    ArticleItem {
        id: c.id,
        title: c.title,
        date: c.date,
        image_url: c.image_url,
        content: resolve_content(record),
        tags: c.tags,
    }
}

/// Normalizes a whole listing, preserving backend order.
pub fn normalize_all(
    records: &[RawAnalysisRecord],
    storage_base_url: &str,
    today: NaiveDate,
) -> Vec<ArticleListItem> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| to_list_item(record, idx + 1, storage_base_url, today))
        .collect()
}

/// Read path over the analysis backend
#[derive(Clone)]
pub struct ArticleService {
    backend: Arc<dyn AnalysisBackend>,
    storage_base_url: String,
    lookup: ArticleLookup,
}

impl ArticleService {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        storage_base_url: impl Into<String>,
        lookup: ArticleLookup,
    ) -> Self {
        Self {
            backend,
            storage_base_url: storage_base_url.into(),
            lookup,
        }
    }

    pub async fn list_articles(&self) -> Result<Vec<ArticleListItem>, BackendError> {
        let records = self.backend.list_records().await?;
        Ok(normalize_all(&records, &self.storage_base_url, today()))
    }

    /// Resolves one article by the id the listing exposed for it.
    pub async fn get_article(&self, id: &str) -> Result<ArticleItem, BackendError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(BackendError::NotFound);
        }

        match self.lookup {
            ArticleLookup::Direct => {
                let record = self.backend.find_record(id).await?;
                let resolved = record.id.clone().unwrap_or_else(|| parse_id(id));
                Ok(to_article_item(&record, resolved, &self.storage_base_url, today()))
            }
            ArticleLookup::Positional => {
                let records = self.backend.list_records().await?;
                records
                    .iter()
                    .enumerate()
                    .map(|(idx, record)| (resolve_id(record, idx + 1), record))
                    .find(|(resolved, _)| resolved.matches(id))
                    .map(|(resolved, record)| {
                        to_article_item(record, resolved, &self.storage_base_url, today())
                    })
                    .ok_or(BackendError::NotFound)
            }
        }
    }
}

fn parse_id(raw: &str) -> ArticleId {
    raw.parse::<u64>()
        .map(ArticleId::Number)
        .unwrap_or_else(|_| ArticleId::Text(raw.to_string()))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
