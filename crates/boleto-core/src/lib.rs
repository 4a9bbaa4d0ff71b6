//! Core library for payment-slip (boleto) scanning.
//!
//! This crate provides:
//! - Text-recognition collaborators (Cloud Vision, local PaddleOCR models, plain text)
//! - Field extraction for amount, due date, payee and reference code
//! - Merging of extracted fields with caller overrides
//! - The scan pipeline producing a record ready for billing-entry creation

pub mod error;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod slip;

pub use error::{BoletoError, ErrorKind, ExtractionError, OcrError, Result};
pub use models::config::BoletoConfig;
pub use models::record::{
    BillingStatus, NewBillingEntry, PartialBillingRecord, ReconciledBillingRecord, RequiredField,
};
pub use ocr::{create_recognizer, PlainTextRecognizer, RecognizedText, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::OnnxRecognizer;
#[cfg(feature = "vision")]
pub use ocr::VisionRecognizer;
pub use pipeline::{ScanHandle, ScanPipeline};
pub use slip::{FieldMergeResolver, SlipExtraction, SlipParser};
