//! Payee (beneficiary) name extraction.

use tracing::{debug, info};

use super::normalize::{clean_payee, is_valid_payee, MIN_PAYEE_LEN};
use super::patterns::{LONG_DIGIT_RUN, PAYEE_LABEL, PAYEE_STOP_LINE, UPPERCASE_RUN};
use super::{first_match, ExtractedField, FieldExtractor, Strategy};

/// Returned when no payee candidate validates.
pub const UNIDENTIFIED_PAYEE: &str = "Fornecedor não identificado";

const MAX_LINE_LEN: usize = 100;

/// Payee field extractor.
pub struct PayeeExtractor;

impl PayeeExtractor {
    pub fn new() -> Self {
        Self
    }

    fn label_anchored(text: &str) -> Option<ExtractedField<String>> {
        let found = label_candidates(text).into_iter().next();
        if let Some(ref field) = found {
            info!("Payee found via beneficiary label: {}", field.value);
        }
        found
    }

    fn first_plausible_line(text: &str) -> Option<ExtractedField<String>> {
        let found = line_candidates(text).into_iter().next();
        if let Some(ref field) = found {
            info!("Payee found via first plausible line: {}", field.value);
        }
        found
    }

    fn uppercase_run(text: &str) -> Option<ExtractedField<String>> {
        let found = uppercase_candidates(text).into_iter().next();
        if let Some(ref field) = found {
            info!("Payee found via uppercase run: {}", field.value);
        }
        found
    }
}

impl Default for PayeeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PayeeExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<ExtractedField<String>> {
        first_match(
            text,
            &[
                &Self::label_anchored,
                &Self::first_plausible_line,
                &Self::uppercase_run,
            ],
        )
    }

    fn extract_all(&self, text: &str) -> Vec<ExtractedField<String>> {
        let mut results = label_candidates(text);
        results.extend(line_candidates(text));
        results.extend(uppercase_candidates(text));
        results
    }
}

/// Extract the payee name, or [`UNIDENTIFIED_PAYEE`] when nothing validates.
pub fn extract_payee(text: &str) -> String {
    match PayeeExtractor::new().extract(text) {
        Some(field) => field.value,
        None => {
            debug!("No payee candidate validated, using placeholder");
            UNIDENTIFIED_PAYEE.to_string()
        }
    }
}

fn validated(raw: &str, strategy: Strategy, start: usize, end: usize) -> Option<ExtractedField<String>> {
    let cleaned = clean_payee(raw);
    if !is_valid_payee(&cleaned) {
        debug!("Rejected payee candidate {:?} ({})", cleaned, strategy);
        return None;
    }
    Some(ExtractedField::new(cleaned, strategy, raw).with_position(start, end))
}

fn label_candidates(text: &str) -> Vec<ExtractedField<String>> {
    PAYEE_LABEL
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            validated(name.as_str(), Strategy::LabelAnchored, name.start(), name.end())
        })
        .collect()
}

fn line_candidates(text: &str) -> Vec<ExtractedField<String>> {
    let mut results = Vec::new();
    let mut offset = 0;

    for raw_line in text.split_inclusive('\n') {
        let start = offset;
        offset += raw_line.len();

        let line = raw_line.trim();
        let len = line.chars().count();
        if !(MIN_PAYEE_LEN..=MAX_LINE_LEN).contains(&len)
            || LONG_DIGIT_RUN.is_match(line)
            || PAYEE_STOP_LINE.is_match(line)
            || !line.chars().next().is_some_and(char::is_alphabetic)
        {
            continue;
        }

        if let Some(field) = validated(line, Strategy::Positional, start, start + raw_line.len()) {
            results.push(field);
        }
    }

    results
}

fn uppercase_candidates(text: &str) -> Vec<ExtractedField<String>> {
    UPPERCASE_RUN
        .find_iter(text)
        .filter_map(|m| validated(m.as_str(), Strategy::GenericScan, m.start(), m.end()))
        .collect()
}
