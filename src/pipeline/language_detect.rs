//! Lightweight language detection for raw invoice text.
//!
//! Scans for literal vocabulary that only shows up on invoices written in a
//! known non-canonical language (invoice title, date label). Currency symbols
//! and "total" lines are shared across languages and are not markers. Best
//! effort: anything unrecognised is treated as the canonical language. No I/O,
//! no scoring, fully deterministic.

use serde::Serialize;

/// Language every document is translated into before summarization.
pub const CANONICAL_LANGUAGE: &str = "English";

/// Marker vocabulary for one language.
struct LanguageMarkers {
    language: &'static str,
    /// Case-sensitive tokens; any one of them is enough.
    tokens: &'static [&'static str],
}

/// Declaration order is precedence order: the first language that matches wins.
const LANGUAGE_MARKERS: &[LanguageMarkers] = &[
    LanguageMarkers {
        language: "Spanish",
        tokens: &["Factura", "Fecha"],
    },
    LanguageMarkers {
        language: "German",
        tokens: &["Rechnung", "Datum"],
    },
];

/// Result of a language scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageDetection {
    pub language: String,
    pub needs_translation: bool,
}

impl LanguageDetection {
    fn canonical() -> Self {
        Self {
            language: CANONICAL_LANGUAGE.to_string(),
            needs_translation: false,
        }
    }
}

/// Detect the language of a document.
pub fn detect_language(text: &str) -> LanguageDetection {
    LANGUAGE_MARKERS
        .iter()
        .find(|markers| markers.tokens.iter().any(|token| text.contains(token)))
        .map(|markers| LanguageDetection {
            language: markers.language.to_string(),
            needs_translation: true,
        })
        .unwrap_or_else(LanguageDetection::canonical)
}
