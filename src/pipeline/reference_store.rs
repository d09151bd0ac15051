//! Read-only lookup table of expected invoice totals and currencies.
//!
//! Loaded once at startup, either from the built-in record set or from a
//! JSON file, then shared by every run. Nothing in the pipeline mutates it.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::models::ReferenceRecord;

#[derive(Error, Debug)]
pub enum ReferenceStoreError {
    #[error("Cannot read reference file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid reference file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate reference record for invoice {0}")]
    DuplicateInvoice(String),
}

/// Enterprise system of record, keyed by invoice number.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    records: HashMap<String, ReferenceRecord>,
}

impl ReferenceStore {
    /// Build a store, rejecting duplicate invoice numbers.
    pub fn from_records(
        records: impl IntoIterator<Item = ReferenceRecord>,
    ) -> Result<Self, ReferenceStoreError> {
        let mut map = HashMap::new();
        for record in records {
            if map.contains_key(&record.invoice_number) {
                return Err(ReferenceStoreError::DuplicateInvoice(record.invoice_number));
            }
            map.insert(record.invoice_number.clone(), record);
        }
        Ok(Self { records: map })
    }

    /// The records shipped with the service.
    pub fn builtin() -> Self {
        let records = [
            ReferenceRecord::new("INV-2024-001", 250.00, "USD"),
            ReferenceRecord::new("FAC-2023-11-15", 250.00, "EUR"),
            ReferenceRecord::new("RECH-2024-03-20", 500.00, "EUR"),
        ];
        Self {
            records: records
                .into_iter()
                .map(|r| (r.invoice_number.clone(), r))
                .collect(),
        }
    }

    /// Load a JSON array of `{invoice_number, expected_total, expected_currency}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ReferenceStoreError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ReferenceStoreError::Io {
            path: shown.clone(),
            source,
        })?;
        let records: Vec<ReferenceRecord> =
            serde_json::from_str(&raw).map_err(|source| ReferenceStoreError::Json {
                path: shown.clone(),
                source,
            })?;

        let store = Self::from_records(records)?;
        tracing::info!(path = %shown, records = store.len(), "Reference store loaded");
        Ok(store)
    }

    pub fn lookup(&self, invoice_number: &str) -> Option<&ReferenceRecord> {
        self.records.get(invoice_number)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
