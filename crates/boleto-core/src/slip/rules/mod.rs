//! Rule-based field extractors for payment slips.

pub mod amounts;
pub mod barcode;
pub mod dates;
pub mod normalize;
pub mod patterns;
pub mod payee;

pub use amounts::{extract_amount, AmountExtractor};
pub use barcode::{extract_reference_code, ReferenceCodeExtractor};
pub use dates::{extract_due_date, DueDateExtractor};
pub use normalize::{format_brl_amount, parse_brl_amount, parse_slip_date};
pub use payee::{extract_payee, PayeeExtractor, UNIDENTIFIED_PAYEE};

use std::fmt;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text, applying the strategy order and tie-breaks.
    fn extract(&self, text: &str) -> Option<ExtractedField<Self::Output>>;

    /// Every plausible candidate, in strategy order then document order.
    fn extract_all(&self, text: &str) -> Vec<ExtractedField<Self::Output>>;
}

/// How a candidate value was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Found next to a known label.
    LabelAnchored,
    /// Found by scanning the whole text for a value-shaped pattern.
    GenericScan,
    /// Found by its position in the document (e.g. the first plausible line).
    Positional,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LabelAnchored => "label",
            Self::GenericScan => "scan",
            Self::Positional => "position",
        };
        f.write_str(name)
    }
}

/// A candidate value with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField<T> {
    /// Extracted value.
    pub value: T,
    /// Strategy that found it.
    pub strategy: Strategy,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractedField<T> {
    pub fn new(value: T, strategy: Strategy, source: impl Into<String>) -> Self {
        Self {
            value,
            strategy,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// An ordered fallback chain: the first strategy yielding a value wins.
pub(crate) fn first_match<T>(
    text: &str,
    strategies: &[&dyn Fn(&str) -> Option<ExtractedField<T>>],
) -> Option<ExtractedField<T>> {
    strategies.iter().find_map(|strategy| strategy(text))
}
