//! Billing record models for scanned payment slips.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// A billing record with every field optional.
///
/// Used both for the caller-supplied overrides and for what the extractors
/// found in the recognized text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialBillingRecord {
    /// Document amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Payment due date.
    #[serde(default, with = "br_date::option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Payee (beneficiary) name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,

    /// Digitable line or raw barcode digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,

    /// Free-text notes. Never populated by extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Category the entry should be filed under. Never populated by extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl PartialBillingRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    pub fn with_reference_code(mut self, code: impl Into<String>) -> Self {
        self.reference_code = Some(code.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Result of merging user overrides with extracted fields.
///
/// Same shape as [`PartialBillingRecord`]; only usable for record creation
/// once amount, due date and payee are all present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledBillingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    #[serde(default, with = "br_date::option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl ReconciledBillingRecord {
    /// Mandatory fields that are absent, in display order.
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push(RequiredField::Amount);
        }
        if self.due_date.is_none() {
            missing.push(RequiredField::DueDate);
        }
        if self.payee.as_deref().is_none_or(|p| p.trim().is_empty()) {
            missing.push(RequiredField::Payee);
        }
        missing
    }

    /// Check that amount, due date and payee are all present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fail with [`ExtractionError::Incomplete`] unless complete.
    pub fn ensure_complete(&self) -> Result<(), ExtractionError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExtractionError::Incomplete { missing })
        }
    }
}

/// Mandatory billing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Amount,
    DueDate,
    Payee,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Amount => "amount",
            Self::DueDate => "due date",
            Self::Payee => "payee",
        };
        f.write_str(name)
    }
}

/// Payment status of a billing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatus {
    /// Awaiting payment, not yet due.
    Pending,
    /// Due date has passed.
    Overdue,
    /// Marked as paid.
    Paid,
}

impl BillingStatus {
    /// Initial status for a new entry: overdue if the due date is already past.
    pub fn for_due_date(due_date: NaiveDate, today: NaiveDate) -> Self {
        if due_date < today {
            Self::Overdue
        } else {
            Self::Pending
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
        };
        f.write_str(name)
    }
}

/// Input for the external "create billing entry" operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBillingEntry {
    pub payee: String,

    pub amount: Decimal,

    #[serde(with = "br_date")]
    pub due_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    pub status: BillingStatus,
}

impl NewBillingEntry {
    /// Build a creation request from a reconciled record.
    pub fn from_reconciled(
        record: ReconciledBillingRecord,
        today: NaiveDate,
    ) -> Result<Self, ExtractionError> {
        let missing = record.missing_fields();

        match (record.amount, record.due_date, record.payee) {
            (Some(amount), Some(due_date), Some(payee)) if missing.is_empty() => Ok(Self {
                payee,
                amount,
                due_date,
                reference_code: record.reference_code.filter(|c| !c.trim().is_empty()),
                notes: record.notes,
                category_id: record.category_id,
                status: BillingStatus::for_due_date(due_date, today),
            }),
            _ => Err(ExtractionError::Incomplete { missing }),
        }
    }
}

/// Serde helpers for `dd/MM/yyyy` dates.
pub mod br_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }

    /// Same format for optional dates.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let s: Option<String> = Option::deserialize(deserializer)?;
            s.map(|s| NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
