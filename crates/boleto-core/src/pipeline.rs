//! Scan reconciliation pipeline.
//!
//! One scan: recognize text, run the field extractors, merge with the
//! caller's overrides and check that the mandatory fields are present.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{BoletoError, Result};
use crate::models::config::BoletoConfig;
use crate::models::record::{PartialBillingRecord, ReconciledBillingRecord};
use crate::ocr::{create_recognizer, TextRecognizer};
use crate::slip::{FieldMergeResolver, SlipParser};

/// Orchestrates OCR, extraction and merging for payment slips.
///
/// Holds no per-scan state, so one pipeline can serve any number of
/// concurrent scans.
pub struct ScanPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    parser: SlipParser,
}

impl ScanPipeline {
    /// Create a pipeline around a text recognizer.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            parser: SlipParser::new(),
        }
    }

    /// Create a pipeline from configuration.
    pub fn from_config(config: &BoletoConfig) -> Self {
        let mut parser = SlipParser::new();
        if let Some(date) = config.extraction.reference_date {
            parser = parser.with_reference_date(date);
        }
        Self::new(create_recognizer(&config.ocr)).with_parser(parser)
    }

    /// Set the slip parser.
    pub fn with_parser(mut self, parser: SlipParser) -> Self {
        self.parser = parser;
        self
    }

    /// Name of the configured recognizer.
    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Scan one image and reconcile it with the caller's overrides.
    ///
    /// Fails with an OCR error if recognition fails (extraction is not
    /// attempted), or with an incomplete-extraction error naming the
    /// mandatory fields still absent after the merge.
    pub async fn run(
        &self,
        image: &[u8],
        user: &PartialBillingRecord,
    ) -> Result<ReconciledBillingRecord> {
        info!(
            "Scanning {} byte document with {} recognizer",
            image.len(),
            self.recognizer.name()
        );

        let recognized = self.recognizer.recognize(image).await.map_err(|e| {
            warn!("Text recognition failed: {}", e);
            BoletoError::from(e)
        })?;

        info!(
            "Recognized {} characters in {}ms",
            recognized.text.chars().count(),
            recognized.processing_time_ms
        );
        if recognized.is_empty() {
            warn!("No text found in document");
        }

        let extraction = self.parser.parse(&recognized.text);
        for warning in &extraction.warnings {
            debug!("{}", warning);
        }

        let record = FieldMergeResolver::merge(user, &extraction.record);
        record.ensure_complete()?;

        info!("Scan reconciled in {}ms", recognized.processing_time_ms + extraction.processing_time_ms);
        Ok(record)
    }

    /// Run a scan as its own task.
    ///
    /// The scan runs to completion or failure whether or not the handle is
    /// awaited.
    pub fn spawn(self: &Arc<Self>, image: Vec<u8>, user: PartialBillingRecord) -> ScanHandle {
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move { pipeline.run(&image, &user).await });
        ScanHandle { task }
    }
}

/// Handle to a spawned scan.
pub struct ScanHandle {
    task: JoinHandle<Result<ReconciledBillingRecord>>,
}

impl ScanHandle {
    /// Check whether the scan has finished, without waiting.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan result.
    pub async fn wait(self) -> Result<ReconciledBillingRecord> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(BoletoError::Task(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, OcrError};
    use crate::models::record::RequiredField;
    use crate::ocr::RecognizedText;
    use crate::slip::rules::UNIDENTIFIED_PAYEE;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRecognizer {
        response: std::result::Result<String, OcrError>,
        calls: AtomicUsize,
    }

    impl MockRecognizer {
        fn text(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: OcrError) -> Arc<Self> {
            Arc::new(Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextRecognizer for MockRecognizer {
        fn name(&self) -> &str {
            "mock"
        }

        async fn recognize(&self, _image: &[u8]) -> std::result::Result<RecognizedText, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map(|text| RecognizedText::new(text, "mock", 1))
        }
    }

    const SLIP: &str = "\
Beneficiário
ACME SERVICOS LTDA
Vencimento 05/03/2026
Valor do Documento R$ 50,00
23790.12345 60000.123456 78901.234567 8 12340000012345
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    fn pipeline(recognizer: Arc<MockRecognizer>) -> ScanPipeline {
        ScanPipeline::new(recognizer).with_parser(SlipParser::new().with_reference_date(today()))
    }

    #[tokio::test]
    async fn test_empty_text_is_incomplete() {
        let err = pipeline(MockRecognizer::text(""))
            .run(b"img", &PartialBillingRecord::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExtractionIncomplete);
        assert_eq!(err.missing_fields(), [RequiredField::Amount, RequiredField::DueDate]);
    }

    #[tokio::test]
    async fn test_ocr_failure_skips_extraction() {
        let recognizer = MockRecognizer::failing(OcrError::Failure("backend error".to_string()));
        let user = PartialBillingRecord::new()
            .with_amount(Decimal::new(10000, 2))
            .with_due_date(today())
            .with_payee("ACME");

        let err = pipeline(recognizer.clone()).run(b"img", &user).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OcrFailure);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ocr_unavailable() {
        let recognizer = MockRecognizer::failing(OcrError::Unavailable("no key".to_string()));
        let err = pipeline(recognizer)
            .run(b"img", &PartialBillingRecord::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OcrUnavailable);
    }

    #[tokio::test]
    async fn test_extracted_fields() {
        let record = pipeline(MockRecognizer::text(SLIP))
            .run(b"img", &PartialBillingRecord::new())
            .await
            .unwrap();

        assert_eq!(record.amount, Some(Decimal::new(5000, 2)));
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2026, 3, 5));
        assert_eq!(record.payee.as_deref(), Some("ACME SERVICOS LTDA"));
        assert_eq!(
            record.reference_code.as_deref(),
            Some("23790123456000012345678901234567812340000012345")
        );
    }

    #[tokio::test]
    async fn test_user_overrides_win() {
        let user = PartialBillingRecord::new()
            .with_amount(Decimal::new(20000, 2))
            .with_notes("aluguel");

        let record = pipeline(MockRecognizer::text(SLIP)).run(b"img", &user).await.unwrap();

        assert_eq!(record.amount, Some(Decimal::new(20000, 2)));
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2026, 3, 5));
        assert_eq!(record.notes.as_deref(), Some("aluguel"));
    }

    #[tokio::test]
    async fn test_overrides_complete_an_empty_scan() {
        let user = PartialBillingRecord::new()
            .with_amount(Decimal::new(9990, 2))
            .with_due_date(today());

        let record = pipeline(MockRecognizer::text("")).run(b"img", &user).await.unwrap();

        assert_eq!(record.amount, Some(Decimal::new(9990, 2)));
        assert_eq!(record.payee.as_deref(), Some(UNIDENTIFIED_PAYEE));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_scans_run_concurrently() {
        let pipeline = Arc::new(pipeline(MockRecognizer::text(SLIP)));

        let ok = pipeline.spawn(b"a".to_vec(), PartialBillingRecord::new());
        let overridden = pipeline.spawn(
            b"b".to_vec(),
            PartialBillingRecord::new().with_payee("Condominio Azul"),
        );

        let ok = ok.wait().await.unwrap();
        let overridden = overridden.wait().await.unwrap();

        assert_eq!(ok.payee.as_deref(), Some("ACME SERVICOS LTDA"));
        assert_eq!(overridden.payee.as_deref(), Some("Condominio Azul"));
    }

    #[tokio::test]
    async fn test_handle_reports_completion() {
        let pipeline = Arc::new(pipeline(MockRecognizer::text("")));
        let handle = pipeline.spawn(Vec::new(), PartialBillingRecord::new());

        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }

        let err = handle.wait().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionIncomplete);
    }
}
