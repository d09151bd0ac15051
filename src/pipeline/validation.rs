// Reconciliation of extracted invoice data against the enterprise reference store.
// A failed reconciliation is a normal outcome reported as data, never an error.
// Pure: the result depends only on the extraction result and the store.

use serde::Serialize;

use super::reference_store::ReferenceStore;
use super::state::ExtractionResult;
use crate::models::InvoiceRecord;

/// Maximum absolute difference between extracted and expected totals.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Absorbs binary rounding noise so a nominal 0.01 difference stays in tolerance.
const FLOAT_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Success,
    Failed,
}

/// Outcome of reconciling one invoice. `messages` is empty iff `status` is `Success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub messages: Vec<String>,
}

impl ValidationResult {
    fn from_messages(messages: Vec<String>) -> Self {
        let status = if messages.is_empty() {
            ValidationStatus::Success
        } else {
            ValidationStatus::Failed
        };
        Self { status, messages }
    }

    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }

    /// Human-readable block used as summarization context.
    pub fn report(&self) -> String {
        if self.is_success() {
            "Validation SUCCESS: Invoice data matches enterprise records.".to_string()
        } else {
            format!("Validation FAILED:\n{}", self.messages.join("\n"))
        }
    }
}

/// Validate an extraction result against the reference store.
pub fn validate_invoice(extracted: &ExtractionResult, store: &ReferenceStore) -> ValidationResult {
    let result = match extracted {
        ExtractionResult::Failed(reason) => {
            ValidationResult::from_messages(vec![format!("EXTRACTION FAILED: {reason}")])
        }
        ExtractionResult::Structured(record) => {
            ValidationResult::from_messages(reconcile(record, store))
        }
    };

    if !result.is_success() {
        tracing::warn!(
            message_count = result.messages.len(),
            "Invoice validation failed"
        );
    }

    result
}

fn reconcile(record: &InvoiceRecord, store: &ReferenceStore) -> Vec<String> {
    let number = &record.invoice_number;
    let Some(expected) = store.lookup(number) else {
        return vec![format!("INVOICE NOT FOUND: {number} not in enterprise system.")];
    };

    let mut messages = Vec::new();

    if !amounts_match(record.total_amount, expected.expected_total) {
        messages.push(format!(
            "AMOUNT MISMATCH: Invoice {number} - Expected {:.2} {}, Got {:.2} {}.",
            expected.expected_total,
            expected.expected_currency,
            record.total_amount,
            record.currency
        ));
    }

    if record.currency != expected.expected_currency {
        messages.push(format!(
            "CURRENCY MISMATCH: Invoice {number} - Expected {}, Got {}.",
            expected.expected_currency, record.currency
        ));
    }

    messages
}

fn amounts_match(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= AMOUNT_TOLERANCE + FLOAT_SLACK
}
