//! Document amount extraction.

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::normalize::parse_brl_amount;
use super::patterns::{AMOUNT_LABEL, AMOUNT_WITH_CURRENCY};
use super::{first_match, ExtractedField, FieldExtractor, Strategy};

/// Amount field extractor.
///
/// Tries the "VALOR DO DOCUMENTO" label first, then scans for currency-marked
/// amounts anywhere in the text.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }

    fn label_anchored(text: &str) -> Option<ExtractedField<Decimal>> {
        let found = label_candidates(text).into_iter().next();
        if let Some(ref field) = found {
            info!("Amount found via document amount label: {}", field.value);
        }
        found
    }

    fn generic_scan(text: &str) -> Option<ExtractedField<Decimal>> {
        let found = select_scanned(scan_candidates(text));
        if let Some(ref field) = found {
            info!("Amount found via currency scan: {}", field.value);
        }
        found
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract(&self, text: &str) -> Option<ExtractedField<Decimal>> {
        let found = first_match(text, &[&Self::label_anchored, &Self::generic_scan]);
        if found.is_none() {
            debug!("No plausible amount found");
        }
        found
    }

    fn extract_all(&self, text: &str) -> Vec<ExtractedField<Decimal>> {
        let mut results = label_candidates(text);
        results.extend(scan_candidates(text));
        results
    }
}

/// Extract the document amount from slip text.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    AmountExtractor::new().extract(text).map(|m| m.value)
}

/// Any accepted amount must be strictly between zero and one million.
pub fn is_plausible_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount < Decimal::from(1_000_000)
}

/// Narrower window used when picking among several scanned candidates.
pub fn is_typical_amount(amount: Decimal) -> bool {
    amount >= Decimal::TEN && amount <= Decimal::from(100_000)
}

fn label_candidates(text: &str) -> Vec<ExtractedField<Decimal>> {
    collect_amounts(text, &AMOUNT_LABEL, Strategy::LabelAnchored, is_plausible_amount)
}

fn scan_candidates(text: &str) -> Vec<ExtractedField<Decimal>> {
    collect_amounts(text, &AMOUNT_WITH_CURRENCY, Strategy::GenericScan, is_plausible_amount)
}

/// First typical candidate in document order, else the first candidate.
fn select_scanned(candidates: Vec<ExtractedField<Decimal>>) -> Option<ExtractedField<Decimal>> {
    let typical = candidates.iter().position(|m| is_typical_amount(m.value));
    if typical.is_none() && candidates.len() > 1 {
        debug!("No scanned amount in the typical window, using the first one");
    }
    candidates.into_iter().nth(typical.unwrap_or(0))
}

fn collect_amounts(
    text: &str,
    pattern: &regex::Regex,
    strategy: Strategy,
    accept: impl Fn(Decimal) -> bool,
) -> Vec<ExtractedField<Decimal>> {
    let mut results = Vec::new();

    for caps in pattern.captures_iter(text) {
        let (Some(full_match), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        match parse_brl_amount(token.as_str()) {
            Some(amount) if accept(amount) => results.push(
                ExtractedField::new(amount, strategy, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            ),
            Some(amount) => {
                debug!("Rejected implausible amount {} ({})", amount, strategy);
            }
            None => {
                debug!("Could not parse amount token {:?}", token.as_str());
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_currency_amount_in_surrounding_text() {
        for text in [
            "R$ 123,45",
            "Total a pagar R$ 123,45 até o vencimento",
            "linha 1\nPague R$123,45\nlinha 3",
            "xx R$   123,45 yy R$ 99.999,00",
        ] {
            assert_eq!(extract_amount(text), Some(dec("123.45")), "text: {text:?}");
        }
    }

    #[test]
    fn test_label_anchored() {
        let text = "Juros R$ 50,00\n(=) Valor do Documento\n1.234,56\nMulta R$ 20,00";
        let found = AmountExtractor::new().extract(text).unwrap();

        assert_eq!(found.value, dec("1234.56"));
        assert_eq!(found.strategy, Strategy::LabelAnchored);
    }

    #[test]
    fn test_label_variants() {
        assert_eq!(extract_amount("VALOR DOCUMENTO: R$ 89,90"), Some(dec("89.90")));
        assert_eq!(extract_amount("valor do documento 1,234.56"), Some(dec("1234.56")));
        assert_eq!(extract_amount("VALOR DO DOCUMENTO 2500,00"), Some(dec("2500.00")));
    }

    #[test]
    fn test_small_label_amount_accepted() {
        let text = "VALOR DO DOCUMENTO: 5,00";
        let found = AmountExtractor::new().extract(text).unwrap();

        assert_eq!(found.value, dec("5.00"));
        assert_eq!(found.strategy, Strategy::LabelAnchored);
    }

    #[test]
    fn test_implausible_label_falls_through() {
        let text = "VALOR DO DOCUMENTO: 1.500.000,00\nCobrado R$ 320,00";
        let found = AmountExtractor::new().extract(text).unwrap();

        assert_eq!(found.value, dec("320.00"));
        assert_eq!(found.strategy, Strategy::GenericScan);
    }

    #[test]
    fn test_scan_window_prefers_typical_amounts() {
        let text = "Tarifa R$ 9,99\nLimite R$ 150.000,00\nTotal R$ 480,10";
        assert_eq!(extract_amount(text), Some(dec("480.10")));

        // nothing typical: first scanned candidate
        assert_eq!(extract_amount("Tarifa R$ 9,99 Limite R$ 150.000,00"), Some(dec("9.99")));
        assert_eq!(extract_amount("Limite R$ 2.000.000,00"), None);
    }

    #[test]
    fn test_single_small_scanned_amount() {
        let found = AmountExtractor::new()
            .extract("Pague ate o vencimento R$ 5,00")
            .unwrap();

        assert_eq!(found.value, dec("5.00"));
        assert_eq!(found.strategy, Strategy::GenericScan);
    }

    #[test]
    fn test_scan_prefers_first_in_document_order() {
        let text = "R$ 75,00\nR$ 1.075,00";
        assert_eq!(extract_amount(text), Some(dec("75.00")));
    }

    #[test]
    fn test_no_amount() {
        assert_eq!(extract_amount(""), None);
        assert_eq!(extract_amount("Pagável em qualquer banco"), None);
        assert_eq!(extract_amount("Nosso número 12345"), None);
    }

    #[test]
    fn test_extract_all_orders_label_first() {
        let text = "R$ 40,00\nVALOR DO DOCUMENTO R$ 60,00";
        let all = AmountExtractor::new().extract_all(text);

        assert_eq!(all[0].value, dec("60.00"));
        assert_eq!(all[0].strategy, Strategy::LabelAnchored);
        assert!(all[1..].iter().all(|m| m.strategy == Strategy::GenericScan));
        assert_eq!(all[1].value, dec("40.00"));
    }
}
