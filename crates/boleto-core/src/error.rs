//! Error types for the boleto-core library.

use thiserror::Error;

use crate::models::record::RequiredField;

/// Main error type for the boleto library.
#[derive(Error, Debug)]
pub enum BoletoError {
    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction / reconciliation error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A spawned scan task could not be joined.
    #[error("scan task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the text-recognition collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// Backend not configured or not reachable.
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// Backend reachable but recognition errored.
    #[error("text recognition failed: {0}")]
    Failure(String),
}

/// Errors related to reconciling extracted fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Mandatory fields still absent after merging user overrides.
    #[error("missing required fields: {}", join_fields(.missing))]
    Incomplete { missing: Vec<RequiredField> },
}

/// Coarse classification of a scan failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OcrUnavailable,
    OcrFailure,
    ExtractionIncomplete,
    Other,
}

impl BoletoError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ocr(OcrError::Unavailable(_)) => ErrorKind::OcrUnavailable,
            Self::Ocr(OcrError::Failure(_)) => ErrorKind::OcrFailure,
            Self::Extraction(ExtractionError::Incomplete { .. }) => ErrorKind::ExtractionIncomplete,
            _ => ErrorKind::Other,
        }
    }

    /// Fields the caller still has to supply, if this is an incomplete extraction.
    pub fn missing_fields(&self) -> &[RequiredField] {
        match self {
            Self::Extraction(ExtractionError::Incomplete { missing }) => missing,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for the boleto library.
pub type Result<T> = std::result::Result<T, BoletoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = BoletoError::from(OcrError::Unavailable("no key".into()));
        assert_eq!(err.kind(), ErrorKind::OcrUnavailable);

        let err = BoletoError::from(OcrError::Failure("boom".into()));
        assert_eq!(err.kind(), ErrorKind::OcrFailure);

        let err = BoletoError::Config("bad".into());
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.missing_fields().is_empty());
    }

    #[test]
    fn test_incomplete_message_lists_fields() {
        let err = BoletoError::from(ExtractionError::Incomplete {
            missing: vec![RequiredField::Amount, RequiredField::DueDate],
        });

        assert_eq!(err.kind(), ErrorKind::ExtractionIncomplete);
        assert_eq!(
            err.missing_fields(),
            &[RequiredField::Amount, RequiredField::DueDate]
        );
        assert_eq!(
            err.to_string(),
            "extraction error: missing required fields: amount, due date"
        );
    }
}
