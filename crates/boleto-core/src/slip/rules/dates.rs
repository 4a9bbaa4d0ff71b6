//! Due date extraction.

use chrono::{Local, Months, NaiveDate};
use tracing::{debug, info};

use super::normalize::parse_slip_date;
use super::patterns::{DATE_DMY, DUE_DATE_LABEL};
use super::{first_match, ExtractedField, FieldExtractor, Strategy};

/// Due date field extractor.
///
/// Only dates inside `(today - 1 year, today + 2 years)` are considered.
pub struct DueDateExtractor {
    reference_date: Option<NaiveDate>,
}

impl DueDateExtractor {
    pub fn new() -> Self {
        Self {
            reference_date: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// The date the plausibility window is centred on.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Check that a date lies strictly inside the plausibility window.
    pub fn is_plausible(&self, date: NaiveDate) -> bool {
        let today = self.today();
        let earliest = today
            .checked_sub_months(Months::new(12))
            .unwrap_or(NaiveDate::MIN);
        let latest = today
            .checked_add_months(Months::new(24))
            .unwrap_or(NaiveDate::MAX);

        date > earliest && date < latest
    }

    fn label_anchored(&self, text: &str) -> Option<ExtractedField<NaiveDate>> {
        let found = self.label_candidates(text).into_iter().next();
        if let Some(ref field) = found {
            info!("Due date found via label: {}", field.value);
        }
        found
    }

    fn generic_scan(&self, text: &str) -> Option<ExtractedField<NaiveDate>> {
        let candidates = self.scan_candidates(text);
        let today = self.today();

        // First date due today or later, else the latest one seen
        if let Some(upcoming) = candidates.iter().find(|c| c.value >= today) {
            info!("Due date found via date scan: {}", upcoming.value);
            return Some(upcoming.clone());
        }

        let latest = candidates.into_iter().max_by_key(|c| c.value);
        if let Some(ref field) = latest {
            info!("Due date found via date scan (latest past date): {}", field.value);
        }
        latest
    }

    fn label_candidates(&self, text: &str) -> Vec<ExtractedField<NaiveDate>> {
        let mut results = Vec::new();

        for caps in DUE_DATE_LABEL.captures_iter(text) {
            let (Some(full_match), Some(date_text)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            match parse_slip_date(date_text.as_str()) {
                Some(date) if self.is_plausible(date) => results.push(
                    ExtractedField::new(date, Strategy::LabelAnchored, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                ),
                Some(date) => debug!("Rejected labelled date outside window: {}", date),
                None => debug!("Could not parse labelled date {:?}", date_text.as_str()),
            }
        }

        results
    }

    fn scan_candidates(&self, text: &str) -> Vec<ExtractedField<NaiveDate>> {
        DATE_DMY
            .find_iter(text)
            .filter_map(|m| {
                let date = parse_slip_date(m.as_str())?;
                if !self.is_plausible(date) {
                    debug!("Rejected date outside window: {}", date);
                    return None;
                }
                Some(
                    ExtractedField::new(date, Strategy::GenericScan, m.as_str())
                        .with_position(m.start(), m.end()),
                )
            })
            .collect()
    }
}

impl Default for DueDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DueDateExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<ExtractedField<NaiveDate>> {
        let found = first_match(
            text,
            &[
                &|t: &str| self.label_anchored(t),
                &|t: &str| self.generic_scan(t),
            ],
        );
        if found.is_none() {
            debug!("No plausible due date found");
        }
        found
    }

    fn extract_all(&self, text: &str) -> Vec<ExtractedField<NaiveDate>> {
        let mut results = self.label_candidates(text);
        results.extend(self.scan_candidates(text));
        results
    }
}

/// Extract the due date from slip text, relative to the local calendar date.
pub fn extract_due_date(text: &str) -> Option<NaiveDate> {
    DueDateExtractor::new().extract(text).map(|m| m.value)
}
