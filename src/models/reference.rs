use serde::{Deserialize, Serialize};

/// Expected values for one invoice in the enterprise system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub invoice_number: String,
    pub expected_total: f64,
    pub expected_currency: String,
}

impl ReferenceRecord {
    pub fn new(invoice_number: &str, expected_total: f64, expected_currency: &str) -> Self {
        Self {
            invoice_number: invoice_number.to_string(),
            expected_total,
            expected_currency: expected_currency.to_string(),
        }
    }
}
