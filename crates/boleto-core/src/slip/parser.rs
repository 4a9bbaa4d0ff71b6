//! Slip parser running every field extractor over recognized text.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::record::PartialBillingRecord;

use super::rules::{
    AmountExtractor, DueDateExtractor, ExtractedField, FieldExtractor, PayeeExtractor,
    ReferenceCodeExtractor, UNIDENTIFIED_PAYEE,
};

/// Result of parsing one slip's text.
#[derive(Debug, Clone)]
pub struct SlipExtraction {
    /// Fields found in the text, ready to be merged with caller overrides.
    pub record: PartialBillingRecord,
    /// Winning amount candidate.
    pub amount: Option<ExtractedField<Decimal>>,
    /// Winning due date candidate.
    pub due_date: Option<ExtractedField<NaiveDate>>,
    /// Winning payee candidate. `None` means the placeholder payee was used.
    pub payee: Option<ExtractedField<String>>,
    /// Winning reference code candidate.
    pub reference_code: Option<ExtractedField<String>>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Parser for payment-slip text.
#[derive(Debug, Clone, Default)]
pub struct SlipParser {
    reference_date: Option<NaiveDate>,
}

impl SlipParser {
    /// Create a parser whose due-date window follows the local calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "today" for the due-date plausibility window.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn date_extractor(&self) -> DueDateExtractor {
        match self.reference_date {
            Some(date) => DueDateExtractor::new().with_reference_date(date),
            None => DueDateExtractor::new(),
        }
    }

    /// Run the four extractors over the same text.
    ///
    /// Never fails: fields that cannot be found are simply absent, except the
    /// payee which falls back to [`UNIDENTIFIED_PAYEE`].
    pub fn parse(&self, text: &str) -> SlipExtraction {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing slip from {} characters of text", text.len());

        let amount = AmountExtractor::new().extract(text);
        if amount.is_none() {
            warnings.push("Could not extract amount".to_string());
        }

        let due_date = self.date_extractor().extract(text);
        if due_date.is_none() {
            warnings.push("Could not extract due date".to_string());
        }

        let payee = PayeeExtractor::new().extract(text);
        if payee.is_none() {
            warnings.push("Could not identify payee".to_string());
        }

        let reference_code = ReferenceCodeExtractor::new().extract(text);
        if reference_code.is_none() {
            warnings.push("Could not extract reference code".to_string());
        }

        let record = PartialBillingRecord {
            amount: amount.as_ref().map(|f| f.value),
            due_date: due_date.as_ref().map(|f| f.value),
            payee: Some(
                payee
                    .as_ref()
                    .map_or_else(|| UNIDENTIFIED_PAYEE.to_string(), |f| f.value.clone()),
            ),
            reference_code: reference_code.as_ref().map(|f| f.value.clone()),
            notes: None,
            category_id: None,
        };

        debug!(
            "Extracted slip fields: amount={:?} due_date={:?} payee={:?} code={}",
            record.amount,
            record.due_date,
            record.payee,
            record.reference_code.is_some()
        );

        SlipExtraction {
            record,
            amount,
            due_date,
            payee,
            reference_code,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::rules::Strategy;
    use pretty_assertions::assert_eq;

    const SLIP: &str = "\
Banco Exemplo S.A. | 237-2 | 23790.12345 60000.123456 78901.234567 8 12340000012345
Local de Pagamento
Pagável em qualquer banco até o vencimento
Beneficiário
ACME SERVICOS DE LIMPEZA LTDA
Vencimento 05/03/2026
Data do Documento 10/02/2026
(=) Valor do Documento R$ 1.234,56
Pagador
JOAO DA SILVA
";

    fn parser() -> SlipParser {
        SlipParser::new().with_reference_date(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap())
    }

    #[test]
    fn test_parse_full_slip() {
        let result = parser().parse(SLIP);

        assert_eq!(result.record.amount, Some(Decimal::new(123456, 2)));
        assert_eq!(result.record.due_date, NaiveDate::from_ymd_opt(2026, 3, 5));
        assert_eq!(result.record.payee.as_deref(), Some("ACME SERVICOS DE LIMPEZA LTDA"));
        assert_eq!(
            result.record.reference_code.as_deref(),
            Some("23790123456000012345678901234567812340000012345")
        );
        assert_eq!(result.record.notes, None);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);

        assert_eq!(result.amount.map(|f| f.strategy), Some(Strategy::LabelAnchored));
        assert_eq!(result.payee.map(|f| f.strategy), Some(Strategy::LabelAnchored));
    }

    #[test]
    fn test_parse_empty_text() {
        let result = parser().parse("");

        assert_eq!(result.record.amount, None);
        assert_eq!(result.record.due_date, None);
        assert_eq!(result.record.payee.as_deref(), Some(UNIDENTIFIED_PAYEE));
        assert_eq!(result.record.reference_code, None);
        assert_eq!(result.warnings.len(), 4);
    }
}
