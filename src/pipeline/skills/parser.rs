use serde::Deserialize;
use serde_json::Value;

use super::{error_detail, SkillError};
use crate::models::{InvoiceRecord, LineItem};

/// Parse the extraction model's response into an invoice record.
pub fn parse_invoice_response(response: &str) -> Result<InvoiceRecord, SkillError> {
    let json_str = extract_json_object(response)?;
    parse_invoice_json(json_str)
}

/// Locate the JSON object in a model response.
///
/// Prefers a ```json fenced block, then any fenced block, then the outermost
/// `{...}` span of the raw text.
fn extract_json_object(response: &str) -> Result<&str, SkillError> {
    for fence in ["```json", "```"] {
        if let Some(start) = response.find(fence) {
            let content_start = start + fence.len();
            let end = response[content_start..].find("```").ok_or_else(|| {
                SkillError::MalformedOutput("Unclosed code block".into())
            })?;
            let block = response[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Ok(block);
            }
        }
    }

    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&response[start..=end]),
        _ => Err(SkillError::MalformedOutput(format!(
            "No JSON object found in model output: {}",
            error_detail(response)
        ))),
    }
}

fn parse_invoice_json(json_str: &str) -> Result<InvoiceRecord, SkillError> {
    #[derive(Deserialize)]
    struct RawInvoice {
        invoice_number: Option<Value>,
        #[serde(alias = "invoice_date")]
        issue_date: Option<Value>,
        total_amount: Option<Value>,
        currency: Option<String>,
        line_items: Option<Vec<Value>>,
    }

    let raw: RawInvoice = serde_json::from_str(json_str)
        .map_err(|e| SkillError::MalformedOutput(format!("Invalid invoice JSON: {e}")))?;

    let invoice_number = raw
        .invoice_number
        .as_ref()
        .and_then(text_from_value)
        .ok_or_else(|| missing_field("invoice_number"))?;
    let issue_date = raw
        .issue_date
        .as_ref()
        .and_then(text_from_value)
        .ok_or_else(|| missing_field("issue_date"))?;
    let total_amount = raw
        .total_amount
        .as_ref()
        .and_then(amount_from_value)
        .ok_or_else(|| missing_field("total_amount"))?;
    let currency = raw
        .currency
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing_field("currency"))?;

    Ok(InvoiceRecord {
        invoice_number,
        issue_date,
        total_amount,
        currency,
        line_items: parse_line_items_lenient(raw.line_items.as_deref()),
    })
}

fn missing_field(field: &str) -> SkillError {
    SkillError::MalformedOutput(format!("Missing or invalid field `{field}`"))
}

/// Parse line items leniently: items that do not fit are skipped.
fn parse_line_items_lenient(items: Option<&[Value]>) -> Vec<LineItem> {
    let Some(items) = items else {
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| {
            Some(LineItem {
                description: item.get("description").and_then(text_from_value)?,
                quantity: item.get("quantity").and_then(amount_from_value)?,
                unit_price: item.get("unit_price").and_then(amount_from_value)?,
            })
        })
        .collect()
}

/// Non-empty text from a JSON string or number (invoice numbers are sometimes bare integers).
fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A number, or a string such as "$1,250.00" or "250,00 €".
fn amount_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount_text(s),
        _ => None,
    }
}

fn parse_amount_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // Both present: the last one is the decimal point ("1.250,00", "1,250.00").
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => single_separator(&cleaned, ','),
        (Some(_), None) => single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };
    normalized.parse().ok()
}

/// One kind of separator only. Exactly three digits after a single separator,
/// or any repeated separator, is thousands grouping ("1,250", "1.250.000");
/// otherwise it is the decimal point ("250,00", "12.5").
fn single_separator(cleaned: &str, sep: char) -> String {
    let groups: Vec<&str> = cleaned.split(sep).collect();
    let grouping = groups.len() > 2 || groups.last().is_some_and(|tail| tail.len() == 3);
    if grouping {
        groups.concat()
    } else {
        cleaned.replace(sep, ".")
    }
}
