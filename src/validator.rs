//! Upload validation
//!
//! Pure checks on the declared MIME type and the byte size of an upload.
//! Both upload routes run these before touching storage; client-side checks
//! are advisory only.

use thiserror::Error;

use crate::config::UploadLimits;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid file type {0:?}. Only JPG and PNG files are accepted.")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes). Maximum size is {max} bytes.")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    EmptyFile,

    #[error("No file provided")]
    MissingFile,

    #[error("Missing {0}")]
    MissingField(&'static str),
}

/// Strips parameters (`; charset=...`) and normalises case.
pub fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Accepts or rejects an upload by type and size.
///
/// The size ceiling is inclusive: a file of exactly `limits.max_bytes` passes.
pub fn validate(
    mime_type: &str,
    size_bytes: u64,
    limits: &UploadLimits,
) -> Result<(), ValidationError> {
    validate_type(mime_type, limits)?;
    validate_size(size_bytes, limits)
}

pub fn validate_type(mime_type: &str, limits: &UploadLimits) -> Result<(), ValidationError> {
    let essence = essence(mime_type);
    if limits.allowed_mime_types.iter().any(|allowed| *allowed == essence) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedType(mime_type.to_string()))
    }
}

pub fn validate_size(size_bytes: u64, limits: &UploadLimits) -> Result<(), ValidationError> {
    if size_bytes > limits.max_bytes {
        return Err(ValidationError::TooLarge {
            size: size_bytes,
            max: limits.max_bytes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_bytes: u64) -> UploadLimits {
        UploadLimits {
            max_bytes,
            ..UploadLimits::default()
        }
    }

    #[test]
    fn accepts_allowed_types() {
        for mime in ["image/jpeg", "image/jpg", "image/png", "IMAGE/PNG", "image/png; q=1"] {
            assert_eq!(validate(mime, 10, &limits(1024)), Ok(()), "{mime}");
        }
    }

    #[test]
    fn rejects_other_types() {
        for mime in ["image/gif", "application/pdf", "text/plain", ""] {
            assert_eq!(
                validate(mime, 10, &limits(1024)),
                Err(ValidationError::UnsupportedType(mime.to_string()))
            );
        }
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let limits = limits(1024 * 1024);

        assert_eq!(validate("image/png", 1024 * 1024, &limits), Ok(()));
        assert_eq!(
            validate("image/png", 1024 * 1024 + 1, &limits),
            Err(ValidationError::TooLarge {
                size: 1024 * 1024 + 1,
                max: 1024 * 1024
            })
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        assert!(matches!(
            validate("image/gif", u64::MAX, &limits(1)),
            Err(ValidationError::UnsupportedType(_))
        ));
    }
}
