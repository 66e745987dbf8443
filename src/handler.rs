//! HTTP request handlers for the image-articles API
//!
//! This module implements the four request paths of the service:
//! - Server-proxied upload of an image to object storage
//! - Issuing a pre-signed URL for a client-direct upload
//! - Listing generated articles with pagination
//! - Fetching a single article

use axum::{
    extract::{
        multipart::Field,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::config::UploadLimits;
use crate::error::AppError;
use crate::keygen::object_key;
use crate::model::{
    ArticleListResponse, ArticleResponse, ListParams, UploadRequest, UploadResponse,
    UploadUrlRequest, UploadUrlResponse,
};
use crate::pagination::paginate;
use crate::state::AppState;
use crate::validator::{self, ValidationError};

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

/// Uploads an image through the server to object storage
///
/// This handler:
/// 1. Reads the `file` field of a multipart form
/// 2. Rejects unsupported types before buffering the body
/// 3. Rejects empty or oversized files
/// 4. Derives the storage key (generated by default)
/// 5. PUTs the bytes to storage, replacing anything at that key
///
/// # Response
///
/// - **200 OK** - `{ success, message, fileUrl, key }`
/// - **400 Bad Request** - missing, empty, oversized or non-image file
/// - **502 Bad Gateway** - storage refused the write or was unreachable
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limits = &state.config.upload;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            upload = Some(read_file(field, limits).await?);
            break;
        }
    }
    let upload = upload.ok_or(ValidationError::MissingFile)?;

    let key = object_key(state.config.key_policy, &upload.file_name, &upload.mime_type);
    tracing::debug!(
        file_name = %upload.file_name,
        key = %key,
        size_bytes = upload.size_bytes,
        "Uploading file"
    );

    let file_url = state
        .storage
        .put_object(&key, &upload.mime_type, upload.bytes)
        .await
        .map_err(AppError::UploadFailed)?;

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        file_url,
        key,
    }))
}

async fn read_file(
    field: Field<'_>,
    limits: &UploadLimits,
) -> Result<UploadRequest, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let mime_type = field.content_type().unwrap_or_default().to_string();

    validator::validate_type(&mime_type, limits)?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let size_bytes = bytes.len() as u64;

    if size_bytes == 0 {
        return Err(ValidationError::EmptyFile.into());
    }
    validator::validate_size(size_bytes, limits)?;

    Ok(UploadRequest {
        bytes,
        file_name,
        mime_type: validator::essence(&mime_type),
        size_bytes,
    })
}

/// Issues a short-lived pre-signed PUT URL for a client-direct upload
///
/// The client then PUTs the raw bytes to `url` with the same `Content-Type`
/// it declared here; the file body never passes through this server.
///
/// # Request Body
///
/// ```json
/// { "filename": "cat.png", "filetype": "image/png", "filesize": 52311 }
/// ```
///
/// # Response
///
/// - **200 OK** - `{ url, key, fileUrl, expiresIn }`
/// - **400 Bad Request** - missing name/type, unsupported type, declared size too large
/// - **500 Internal Server Error** - storage could not sign the URL
pub async fn upload_url(
    State(state): State<AppState>,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> Result<Json<UploadUrlResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limits = &state.config.upload;

    let filename = payload
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or(ValidationError::MissingField("filename"))?;
    let filetype = payload
        .filetype
        .filter(|t| !t.trim().is_empty())
        .ok_or(ValidationError::MissingField("filetype"))?;

    validator::validate_type(&filetype, limits)?;
    if let Some(size) = payload.filesize {
        validator::validate_size(size, limits)?;
    }

    let content_type = validator::essence(&filetype);
    let key = object_key(state.config.key_policy, &filename, &content_type);
    let expires_in = state.config.presign_expiry;

    let url = state
        .storage
        .presign_put(&key, &content_type, expires_in)
        .await
        .map_err(AppError::PresignFailed)?;

    tracing::info!(key = %key, content_type = %content_type, "Issued upload URL");

    Ok(Json(UploadUrlResponse {
        url,
        file_url: state.storage.public_url(&key),
        key,
        expires_in: expires_in.as_secs(),
    }))
}

/// Lists generated articles, newest data straight from the backend
///
/// # Query Parameters
///
/// - `page` (optional) - Page number, starts from 1 (default: 1), clamped to the last page
/// - `pageSize` (optional) - Articles per page; when omitted every article is returned
///
/// # Example Request
///
/// `GET /articles?page=2&pageSize=3`
///
/// # Response
///
/// ```json
/// {
///   "articles": [...],
///   "page": 2,
///   "pageSize": 3,
///   "totalPages": 4,
///   "totalItems": 11,
///   "pageNumbers": [1, 2, 3, 4]
/// }
/// ```
///
/// - **502 Bad Gateway** - the analysis backend failed
pub async fn list_articles(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ArticleListResponse>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let articles = state.articles.list_articles().await?;
    let page_size = params.page_size.unwrap_or(articles.len()).max(1);
    let page = paginate(&articles, page_size, params.page.unwrap_or(1));

    Ok(Json(ArticleListResponse {
        articles: page.items,
        page: page.current_page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        total_items: page.total_items,
        page_numbers: page.page_numbers,
    }))
}

/// Fetches one article by the id the listing exposed
///
/// # Response
///
/// - **200 OK** - `{ article }`
/// - **404 Not Found** - no article with that id
/// - **502 Bad Gateway** - the analysis backend failed
pub async fn get_article(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ArticleResponse>, AppError> {
    let article = state.articles.get_article(&id).await?;
    Ok(Json(ArticleResponse { article }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
