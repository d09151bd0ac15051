use serde::{Deserialize, Serialize};

/// Structured invoice produced by the extraction skill.
///
/// Immutable once built: the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub issue_date: String,
    pub total_amount: f64,
    /// ISO 4217 code as printed on the invoice (e.g. "USD", "EUR").
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}
