//! Merging caller overrides with extracted fields.

use crate::models::record::{PartialBillingRecord, ReconciledBillingRecord};

/// Combines a caller-supplied partial record with what extraction found.
///
/// Each field resolves on its own: a non-blank caller value wins, otherwise
/// the extracted value (which may be absent) is used. Notes and category only
/// ever come from the caller.
pub struct FieldMergeResolver;

impl FieldMergeResolver {
    pub fn merge(
        user: &PartialBillingRecord,
        extracted: &PartialBillingRecord,
    ) -> ReconciledBillingRecord {
        ReconciledBillingRecord {
            amount: user.amount.or(extracted.amount),
            due_date: user.due_date.or(extracted.due_date),
            payee: prefer_text(&user.payee, &extracted.payee),
            reference_code: prefer_text(&user.reference_code, &extracted.reference_code),
            notes: non_blank(&user.notes),
            category_id: user.category_id,
        }
    }
}

fn prefer_text(user: &Option<String>, extracted: &Option<String>) -> Option<String> {
    non_blank(user).or_else(|| non_blank(extracted))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
