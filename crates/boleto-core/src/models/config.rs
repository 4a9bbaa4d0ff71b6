//! Configuration structures for the scan pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BoletoError, Result};

/// Environment variable that overrides the Vision API key.
pub const VISION_API_KEY_ENV: &str = "BOLETO_VISION_API_KEY";

/// Main configuration for the boleto pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoletoConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Which text-recognition backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Google Cloud Vision document text detection.
    #[default]
    Vision,
    /// Local PaddleOCR models.
    Onnx,
    /// Input is already recognized text.
    Text,
}

/// OCR collaborator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Backend to use.
    pub backend: OcrBackendKind,

    /// Cloud Vision settings.
    pub vision: VisionConfig,

    /// Local model settings.
    pub models: ModelConfig,
}

/// Google Cloud Vision REST settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// `images:annotate` endpoint.
    pub endpoint: String,

    /// API key. Without one the backend reports itself unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Get full path to a model file.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fixed "today" for the due-date plausibility window.
    /// Uses the local calendar date when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

impl BoletoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BoletoError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BoletoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = std::env::var(VISION_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.ocr.vision.api_key = Some(key.trim().to_string());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: BoletoConfig =
            serde_json::from_str(r#"{"ocr": {"backend": "text"}}"#).unwrap();

        assert_eq!(config.ocr.backend, OcrBackendKind::Text);
        assert_eq!(config.ocr.vision.timeout_secs, 30);
        assert_eq!(config.ocr.models.detection_model, "det.onnx");
        assert!(config.extraction.reference_date.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BoletoConfig::default();
        config.ocr.backend = OcrBackendKind::Onnx;
        config.extraction.reference_date = NaiveDate::from_ymd_opt(2026, 1, 15);
        config.save(&path).unwrap();

        let loaded = BoletoConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.backend, OcrBackendKind::Onnx);
        assert_eq!(loaded.extraction.reference_date, NaiveDate::from_ymd_opt(2026, 1, 15));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = BoletoConfig::from_file(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, BoletoError::Io(_)));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"ocr": {"backend": "tesseract"}}"#).unwrap();
        let err = BoletoConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BoletoError::Config(_)));
        assert!(err.to_string().starts_with("configuration error: "));
    }

    #[test]
    fn test_model_path() {
        let models = ModelConfig::default();
        assert_eq!(models.path("det.onnx"), PathBuf::from("models/det.onnx"));
    }
}
