//! Text-recognition collaborators.
//!
//! The pipeline only sees the [`TextRecognizer`] trait. Backends:
//! - Google Cloud Vision over REST (feature: vision)
//! - local PaddleOCR models through `pure-onnx-ocr` (feature: native)
//! - plain text passthrough, for pre-recognized files and tests

#[cfg(feature = "native")]
mod onnx;
mod text;
#[cfg(feature = "vision")]
mod vision;

#[cfg(feature = "native")]
pub use onnx::OnnxRecognizer;
pub use text::PlainTextRecognizer;
#[cfg(feature = "vision")]
pub use vision::VisionRecognizer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig};

/// Output of a text-recognition call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedText {
    /// Recognized text, lines separated by newlines. May be empty.
    pub text: String,

    /// Name of the backend that produced it.
    pub engine: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, engine: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            text: text.into(),
            engine: engine.into(),
            processing_time_ms,
        }
    }

    /// Check if nothing was recognized.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A backend that turns image bytes into text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Backend name, for logs and diagnostics.
    fn name(&self) -> &str;

    /// Recognize the text in an image.
    ///
    /// An image without text is `Ok` with empty text, not an error.
    async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, OcrError>;
}

/// Recognizer standing in for a backend that could not be set up.
///
/// Every call fails with [`OcrError::Unavailable`].
pub struct UnavailableRecognizer {
    name: String,
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, _image: &[u8]) -> Result<RecognizedText, OcrError> {
        Err(OcrError::Unavailable(self.reason.clone()))
    }
}

/// Build the recognizer selected in the configuration.
///
/// Setup problems (missing models, backend compiled out) do not fail here;
/// they surface as [`OcrError::Unavailable`] on the first scan.
pub fn create_recognizer(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    match config.backend {
        OcrBackendKind::Text => Arc::new(PlainTextRecognizer::new()),
        OcrBackendKind::Vision => vision_recognizer(config),
        OcrBackendKind::Onnx => onnx_recognizer(config),
    }
}

#[cfg(feature = "vision")]
fn vision_recognizer(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    match VisionRecognizer::new(config.vision.clone()) {
        Ok(recognizer) => Arc::new(recognizer),
        Err(e) => {
            warn!("Vision recognizer unavailable: {}", e);
            Arc::new(UnavailableRecognizer::new("vision", e.to_string()))
        }
    }
}

#[cfg(not(feature = "vision"))]
fn vision_recognizer(_config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    warn!("Vision backend requested but the `vision` feature is disabled");
    Arc::new(UnavailableRecognizer::new(
        "vision",
        "built without the `vision` feature",
    ))
}

#[cfg(feature = "native")]
fn onnx_recognizer(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    match OnnxRecognizer::from_config(&config.models) {
        Ok(recognizer) => Arc::new(recognizer),
        Err(e) => {
            warn!("ONNX recognizer unavailable: {}", e);
            Arc::new(UnavailableRecognizer::new("onnx", e.to_string()))
        }
    }
}

#[cfg(not(feature = "native"))]
fn onnx_recognizer(_config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    warn!("ONNX backend requested but the `native` feature is disabled");
    Arc::new(UnavailableRecognizer::new(
        "onnx",
        "built without the `native` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_recognizer_always_fails() {
        let recognizer = UnavailableRecognizer::new("vision", "no API key");

        assert_eq!(recognizer.name(), "vision");
        assert_eq!(
            recognizer.recognize(b"anything").await,
            Err(OcrError::Unavailable("no API key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_text_recognizer() {
        let config = OcrConfig {
            backend: OcrBackendKind::Text,
            ..Default::default()
        };
        let recognizer = create_recognizer(&config);

        assert_eq!(recognizer.name(), "text");
        let result = recognizer.recognize("VENCIMENTO 05/03/2026".as_bytes()).await.unwrap();
        assert_eq!(result.text, "VENCIMENTO 05/03/2026");
    }

    #[tokio::test]
    async fn test_onnx_without_models_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OcrConfig {
            backend: OcrBackendKind::Onnx,
            ..Default::default()
        };
        config.models.model_dir = dir.path().to_path_buf();

        let err = create_recognizer(&config).recognize(b"\x89PNG").await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }

    #[test]
    fn test_recognized_text_is_empty() {
        assert!(RecognizedText::new(" \n ", "text", 0).is_empty());
        assert!(!RecognizedText::new("R$ 10,00", "text", 0).is_empty());
    }
}
