//! Local OCR using `pure-onnx-ocr` with PaddleOCR models.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::ModelConfig;

use super::{RecognizedText, TextRecognizer};

/// Vertical distance, in pixels, within which regions count as one row.
const ROW_HEIGHT: f64 = 20.0;

/// Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct OnnxRecognizer {
    engine: Arc<pure_onnx_ocr::engine::OcrEngine>,
}

impl OnnxRecognizer {
    /// Load the detection and recognition models named in the configuration.
    ///
    /// Fails with [`OcrError::Unavailable`] when a model file is missing or
    /// cannot be loaded.
    pub fn from_config(models: &ModelConfig) -> Result<Self, OcrError> {
        let det_path = models.path(&models.detection_model);
        let rec_path = models.path(&models.recognition_model);
        let dict_path = models.path(&models.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::Unavailable(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::Unavailable(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", models.model_dir.display());

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

#[async_trait]
impl TextRecognizer for OnnxRecognizer {
    fn name(&self) -> &str {
        "onnx"
    }

    async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let engine = Arc::clone(&self.engine);
        let bytes = image.to_vec();

        // Decoding and inference are CPU-bound; keep them off the async workers.
        let text = tokio::task::spawn_blocking(move || recognize_blocking(&engine, &bytes))
            .await
            .map_err(|e| OcrError::Failure(format!("OCR task failed: {}", e)))??;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!("OCR extracted {} characters in {}ms", text.chars().count(), processing_time_ms);

        Ok(RecognizedText::new(text, self.name(), processing_time_ms))
    }
}

fn recognize_blocking(
    engine: &pure_onnx_ocr::engine::OcrEngine,
    bytes: &[u8],
) -> Result<String, OcrError> {
    let image = decode_image(bytes)?;
    let results = engine
        .run_from_image(&image)
        .map_err(|e| OcrError::Failure(format!("pure-onnx-ocr: {}", e)))?;

    debug!("pure-onnx-ocr returned {} text regions", results.len());

    let mut regions: Vec<(f64, f64, String)> = results
        .iter()
        .map(|r| {
            let (x, y) = top_left(&r.bounding_box);
            (x, y, r.text.replace("[UNK]", " "))
        })
        .collect();
    sort_reading_order(&mut regions);

    Ok(regions
        .into_iter()
        .map(|(_, _, text)| text)
        .collect::<Vec<_>>()
        .join("\n"))
}

fn decode_image(bytes: &[u8]) -> Result<image::DynamicImage, OcrError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| OcrError::Failure(format!("failed to decode image: {}", e)))?;
    debug!("Decoded {}x{} image", image.width(), image.height());
    Ok(image)
}

/// Smallest x and y over the region's exterior points.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)))
}

/// Sort regions top-to-bottom in rows, then left-to-right within a row.
fn sort_reading_order(regions: &mut [(f64, f64, String)]) {
    regions.sort_by(|a, b| {
        let row_a = (a.1 / ROW_HEIGHT) as i64;
        let row_b = (b.1 / ROW_HEIGHT) as i64;
        row_a
            .cmp(&row_b)
            .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
    });
}
