//! Google Cloud Vision document text detection over REST.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::VisionConfig;

use super::{RecognizedText, TextRecognizer};

const FEATURE_TYPE: &str = "DOCUMENT_TEXT_DETECTION";

/// `images:annotate` request body.
#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

/// `images:annotate` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnnotateResponse {
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FullTextAnnotation {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiStatus {
    code: i32,
    message: String,
}

/// Recognizer backed by the Cloud Vision REST API.
pub struct VisionRecognizer {
    client: Client,
    config: VisionConfig,
    api_key: String,
}

impl VisionRecognizer {
    /// Create a recognizer. Fails with [`OcrError::Unavailable`] when no API key is set.
    pub fn new(config: VisionConfig) -> Result<Self, OcrError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrError::Unavailable("no Cloud Vision API key configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        info!("Vision recognizer ready ({})", config.endpoint);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl TextRecognizer for VisionRecognizer {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();

        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature { kind: FEATURE_TYPE }],
            }],
        };

        debug!("Sending {} byte image to Cloud Vision", image.len());

        let resp = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    OcrError::Unavailable(format!("Cloud Vision unreachable: {}", e))
                } else {
                    OcrError::Failure(format!("Cloud Vision request failed: {}", e))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(OcrError::Failure(format!("Cloud Vision returned HTTP {}: {}", status, detail.trim())));
        }

        let payload = resp
            .bytes()
            .await
            .map_err(|e| OcrError::Failure(format!("failed to read Cloud Vision response: {}", e)))?;
        let text = text_from_response(&payload)?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!("OCR extracted {} characters in {}ms", text.chars().count(), processing_time_ms);

        Ok(RecognizedText::new(text, self.name(), processing_time_ms))
    }
}

/// Pull the full document text out of an `images:annotate` response body.
fn text_from_response(body: &[u8]) -> Result<String, OcrError> {
    let response: AnnotateResponse = serde_json::from_slice(body)
        .map_err(|e| OcrError::Failure(format!("invalid Cloud Vision response: {}", e)))?;

    let Some(first) = response.responses.into_iter().next() else {
        warn!("Cloud Vision returned no responses");
        return Ok(String::new());
    };

    if let Some(error) = first.error {
        return Err(OcrError::Failure(format!(
            "Cloud Vision error {}: {}",
            error.code, error.message
        )));
    }

    match first.full_text_annotation {
        Some(annotation) => Ok(annotation.text),
        None => {
            warn!("OCR found no text in the document");
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_unavailable() {
        let err = VisionRecognizer::new(VisionConfig::default()).err();
        assert!(matches!(err, Some(OcrError::Unavailable(_))));

        let config = VisionConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(VisionRecognizer::new(config), Err(OcrError::Unavailable(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(b"img"),
                },
                features: vec![Feature { kind: FEATURE_TYPE }],
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["requests"][0]["image"]["content"], "aW1n");
        assert_eq!(json["requests"][0]["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
    }

    #[test]
    fn test_full_text_annotation() {
        let body = br#"{"responses":[{"fullTextAnnotation":{"text":"VENCIMENTO\n05/03/2026\n","pages":[]}}]}"#;
        assert_eq!(text_from_response(body).unwrap(), "VENCIMENTO\n05/03/2026\n");
    }

    #[test]
    fn test_no_annotation_is_empty_text() {
        assert_eq!(text_from_response(br#"{"responses":[{}]}"#).unwrap(), "");
        assert_eq!(text_from_response(br#"{}"#).unwrap(), "");
    }

    #[test]
    fn test_error_object_is_failure() {
        let body = br#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#;
        assert_eq!(
            text_from_response(body),
            Err(OcrError::Failure("Cloud Vision error 3: Bad image data.".to_string()))
        );
    }

    #[test]
    fn test_undecodable_body_is_failure() {
        assert!(matches!(text_from_response(b"<html>"), Err(OcrError::Failure(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let config = VisionConfig {
            endpoint: "http://127.0.0.1:9/v1/images:annotate".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 2,
        };
        let recognizer = VisionRecognizer::new(config).unwrap();

        let err = recognizer.recognize(b"img").await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)), "got {err:?}");
    }
}
