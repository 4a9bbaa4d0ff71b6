//! Payment reference code (digitable line / barcode) extraction.

use regex::Regex;
use tracing::{debug, info};

use super::normalize::digits_only;
use super::patterns::{
    DIGITABLE_LINE_FLEXIBLE, DIGITABLE_LINE_NOISY, DIGITABLE_LINE_STRICT, RAW_BARCODE,
};
use super::{first_match, ExtractedField, FieldExtractor, Strategy};

/// Accepted reference code lengths, in digits.
pub const MIN_CODE_DIGITS: usize = 44;
pub const MAX_CODE_DIGITS: usize = 48;

/// Reference code extractor.
///
/// Strategies, in order: strict digitable line, flexible digitable line,
/// raw barcode digits, noisy grouped digits.
pub struct ReferenceCodeExtractor;

impl ReferenceCodeExtractor {
    pub fn new() -> Self {
        Self
    }

    fn strict(text: &str) -> Option<ExtractedField<String>> {
        grouped_candidates(text, &DIGITABLE_LINE_STRICT).into_iter().next()
    }

    fn flexible(text: &str) -> Option<ExtractedField<String>> {
        grouped_candidates(text, &DIGITABLE_LINE_FLEXIBLE).into_iter().next()
    }

    fn raw(text: &str) -> Option<ExtractedField<String>> {
        raw_candidates(text).into_iter().next()
    }

    fn noisy(text: &str) -> Option<ExtractedField<String>> {
        grouped_candidates(text, &DIGITABLE_LINE_NOISY).into_iter().next()
    }
}

impl Default for ReferenceCodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ReferenceCodeExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<ExtractedField<String>> {
        let found = first_match(
            text,
            &[&Self::strict, &Self::flexible, &Self::raw, &Self::noisy],
        );
        match found {
            Some(ref field) => info!("Reference code found ({} digits)", field.value.len()),
            None => debug!("No reference code found"),
        }
        found
    }

    fn extract_all(&self, text: &str) -> Vec<ExtractedField<String>> {
        let mut results = grouped_candidates(text, &DIGITABLE_LINE_STRICT);
        results.extend(grouped_candidates(text, &DIGITABLE_LINE_FLEXIBLE));
        results.extend(raw_candidates(text));
        results.extend(grouped_candidates(text, &DIGITABLE_LINE_NOISY));
        results
    }
}

/// Extract the reference code digits from slip text.
pub fn extract_reference_code(text: &str) -> Option<String> {
    ReferenceCodeExtractor::new().extract(text).map(|m| m.value)
}

fn grouped_candidates(text: &str, pattern: &Regex) -> Vec<ExtractedField<String>> {
    pattern
        .find_iter(text)
        .filter_map(|m| {
            let digits = digits_only(m.as_str());
            if !(MIN_CODE_DIGITS..=MAX_CODE_DIGITS).contains(&digits.len()) {
                debug!("Rejected grouped code with {} digits", digits.len());
                return None;
            }
            Some(
                ExtractedField::new(digits, Strategy::GenericScan, m.as_str())
                    .with_position(m.start(), m.end()),
            )
        })
        .collect()
}

// All whitespace goes, line breaks included, so a wrapped barcode rejoins.
fn raw_candidates(text: &str) -> Vec<ExtractedField<String>> {
    let compacted: String = text.split_whitespace().collect();

    RAW_BARCODE
        .find_iter(&compacted)
        .map(|m| ExtractedField::new(m.as_str().to_string(), Strategy::GenericScan, m.as_str()))
        .collect()
}
