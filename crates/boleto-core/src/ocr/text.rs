//! Passthrough recognizer for input that is already text.

use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::error::OcrError;

use super::{RecognizedText, TextRecognizer};

/// Treats the input bytes as UTF-8 text (invalid sequences are replaced).
#[derive(Debug, Clone, Default)]
pub struct PlainTextRecognizer;

impl PlainTextRecognizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextRecognizer for PlainTextRecognizer {
    fn name(&self) -> &str {
        "text"
    }

    async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let text = String::from_utf8_lossy(image).replace("\r\n", "\n");
        debug!("Passing through {} bytes as text", image.len());

        Ok(RecognizedText::new(
            text,
            self.name(),
            start.elapsed().as_millis() as u64,
        ))
    }
}
