//! Per-run mutable state.
//!
//! One `RunState` per invocation, threaded through the shared workflow by the
//! orchestrator. Every stage output is write-once: a second write is an
//! internal fault, not an overwrite.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::credential::Credential;
use super::language_detect::LanguageDetection;
use super::validation::ValidationResult;
use super::workflow::Stage;
use super::PipelineError;
use crate::models::InvoiceRecord;

/// Shown to the summarizer in place of extracted data when extraction failed.
pub const NO_EXTRACTED_DATA: &str = "No extracted data available (extraction failed).";

/// Output of the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ExtractionResult {
    Structured(InvoiceRecord),
    Failed(String),
}

impl ExtractionResult {
    /// Textual form handed to the summarizer.
    pub fn context_repr(&self) -> String {
        match self {
            Self::Structured(record) => serde_json::to_string_pretty(record)
                .unwrap_or_else(|_| format!("{record:?}")),
            Self::Failed(_) => NO_EXTRACTED_DATA.to_string(),
        }
    }
}

/// Output of the translation branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Translated(String),
    /// Translation was not needed; holds the original text unchanged.
    PassThrough(String),
    Failed(String),
}

impl TranslationOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Translated(text) | Self::PassThrough(text) => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Output of the summarization stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Completed(String),
    Failed(String),
}

#[derive(Debug, Serialize)]
pub struct RunState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    document_text: String,
    #[serde(skip)]
    credential: Credential,
    extracted: Option<ExtractionResult>,
    detected_language: Option<String>,
    needs_translation: bool,
    translated_text: Option<TranslationOutcome>,
    validation_outcome: Option<ValidationResult>,
    summary: Option<SummaryOutcome>,
    trail: Vec<Stage>,
}

impl RunState {
    /// Fresh state in the `Loaded` stage: input present, every output unset.
    pub fn new(document_text: String, credential: Credential) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            document_text,
            credential,
            extracted: None,
            detected_language: None,
            needs_translation: false,
            translated_text: None,
            validation_outcome: None,
            summary: None,
            trail: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn extracted(&self) -> Option<&ExtractionResult> {
        self.extracted.as_ref()
    }

    pub fn detected_language(&self) -> Option<&str> {
        self.detected_language.as_deref()
    }

    pub fn needs_translation(&self) -> bool {
        self.needs_translation
    }

    pub fn translated_text(&self) -> Option<&TranslationOutcome> {
        self.translated_text.as_ref()
    }

    pub fn validation_outcome(&self) -> Option<&ValidationResult> {
        self.validation_outcome.as_ref()
    }

    pub fn summary(&self) -> Option<&SummaryOutcome> {
        self.summary.as_ref()
    }

    /// Stages entered so far, in order.
    pub fn trail(&self) -> &[Stage] {
        &self.trail
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        self.trail.push(stage);
    }

    pub(crate) fn set_extracted(&mut self, value: ExtractionResult) -> Result<(), PipelineError> {
        write_once(&mut self.extracted, value, "extracted")
    }

    pub(crate) fn set_language(&mut self, detection: LanguageDetection) -> Result<(), PipelineError> {
        write_once(&mut self.detected_language, detection.language, "detected_language")?;
        self.needs_translation = detection.needs_translation;
        Ok(())
    }

    pub(crate) fn set_translation(
        &mut self,
        value: TranslationOutcome,
    ) -> Result<(), PipelineError> {
        write_once(&mut self.translated_text, value, "translated_text")
    }

    pub(crate) fn set_validation(&mut self, value: ValidationResult) -> Result<(), PipelineError> {
        write_once(&mut self.validation_outcome, value, "validation_outcome")
    }

    pub(crate) fn set_summary(&mut self, value: SummaryOutcome) -> Result<(), PipelineError> {
        write_once(&mut self.summary, value, "summary")
    }

    /// Names of stage outputs that are still unset.
    pub fn unset_fields(&self) -> Vec<&'static str> {
        let mut unset = Vec::new();
        if self.extracted.is_none() {
            unset.push("extracted");
        }
        if self.detected_language.is_none() {
            unset.push("detected_language");
        }
        if self.translated_text.is_none() {
            unset.push("translated_text");
        }
        if self.validation_outcome.is_none() {
            unset.push("validation_outcome");
        }
        if self.summary.is_none() {
            unset.push("summary");
        }
        unset
    }

    /// Single context block handed to the summarizer.
    pub(crate) fn summarization_context(&self) -> Result<String, PipelineError> {
        let extracted = self
            .extracted
            .as_ref()
            .ok_or(PipelineError::FieldUnset("extracted"))?;
        let language = self
            .detected_language
            .as_deref()
            .ok_or(PipelineError::FieldUnset("detected_language"))?;
        let validation = self
            .validation_outcome
            .as_ref()
            .ok_or(PipelineError::FieldUnset("validation_outcome"))?;

        let mut context = format!(
            "Invoice Content (Original):\n{}\n\n\
             Extracted Data:\n{}\n\n\
             Language Detected: {}\n\
             Needs Translation: {}\n",
            self.document_text,
            extracted.context_repr(),
            language,
            self.needs_translation,
        );

        if self.needs_translation {
            let translated = match &self.translated_text {
                Some(TranslationOutcome::Failed(reason)) => {
                    format!("Translation unavailable: {reason}")
                }
                Some(outcome) => outcome.text().unwrap_or_default().to_string(),
                None => return Err(PipelineError::FieldUnset("translated_text")),
            };
            context.push_str(&format!("Translated Content:\n{translated}\n\n"));
        }

        context.push_str(&format!("Validation Result:\n{}\n", validation.report()));
        Ok(context)
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), PipelineError> {
    if slot.is_some() {
        return Err(PipelineError::FieldAlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}
