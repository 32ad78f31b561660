//! Error types module
//!
//! Unified error type for the document-vault service surface. Leaf crates
//! keep their own error enums (`VaultError` in akiba-storage,
//! `ValidationError` in akiba-processing); this type is what callers of the
//! service facade see.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    /// Whether this error is a per-file validation rejection (safe to report
    /// in a batch error slot and continue).
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::PayloadTooLarge(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::from(io);
        assert!(matches!(err, AppError::Io(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        assert!(AppError::Validation("bad ext".into()).is_validation());
        assert!(AppError::PayloadTooLarge("52MB".into()).is_validation());
        assert!(!AppError::NotFound("gone".into()).is_validation());
    }
}
