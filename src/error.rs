//! Error taxonomy and its HTTP mapping
//!
//! Every failure a handler can produce ends up as an [`AppError`], which
//! renders as `{ "error": "..." }` with the matching status code. Transport
//! errors from storage or the backend are translated here and never leak as
//! raw client errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::storage::StorageError;
use crate::validator::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Bad type or size, user-correctable
    #[error("{0}")]
    InvalidFile(#[from] ValidationError),

    /// Malformed request body that is not about the file itself
    #[error("{0}")]
    BadRequest(String),

    /// The storage write was rejected or never reached storage
    #[error("Failed to upload file to storage: {0}")]
    UploadFailed(StorageError),

    /// The storage service could not produce a pre-signed URL
    #[error("Failed to get signed URL: {0}")]
    PresignFailed(StorageError),

    /// The analysis backend was unreachable or answered non-2xx
    #[error("Error fetching articles: {0}")]
    Upstream(BackendError),

    #[error("Article not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidFile(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UploadFailed(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::PresignFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => AppError::NotFound,
            other => AppError::Upstream(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::InvalidFile(_) | AppError::BadRequest(_) => {
                tracing::info!(error = %self, "Rejected request")
            }
            AppError::NotFound => tracing::debug!("Article not found"),
            _ => tracing::error!(error = %self, status = status.as_u16(), "Request failed"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::from(ValidationError::EmptyFile).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UploadFailed(StorageError::Unreachable("reset".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(BackendError::Status {
                status: 503,
                body: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::PresignFailed(StorageError::PresignUnsupported).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn backend_not_found_becomes_404() {
        let err = AppError::from(BackendError::NotFound);
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
