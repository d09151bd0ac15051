use super::SkillError;
use crate::models::InvoiceRecord;
use crate::pipeline::credential::Credential;

/// Text-generation backend abstraction (allows mocking).
pub trait LlmClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, SkillError>;
}

/// Turns raw invoice text into a structured record.
pub trait InvoiceExtractor {
    fn extract(&self, document_text: &str) -> Result<InvoiceRecord, SkillError>;
}

/// Translates text into the target language it was built for.
pub trait Translator {
    fn translate(&self, text: &str) -> Result<String, SkillError>;
}

pub trait Summarizer {
    fn summarize(&self, text: &str) -> Result<String, SkillError>;
}

/// Builds per-run skill adapters.
///
/// The credential and target language are construction parameters, so no
/// adapter ever reads them from shared state. Construction may fail; the
/// orchestrator records that failure like any other skill failure.
pub trait SkillFactory: Send + Sync {
    fn extractor(&self, credential: &Credential) -> Result<Box<dyn InvoiceExtractor>, SkillError>;

    fn translator(
        &self,
        credential: &Credential,
        target_language: &str,
    ) -> Result<Box<dyn Translator>, SkillError>;

    fn summarizer(&self, credential: &Credential) -> Result<Box<dyn Summarizer>, SkillError>;
}
