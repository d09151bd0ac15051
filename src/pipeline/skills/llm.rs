//! LLM-backed skills: extraction, translation, summarization.
//!
//! `LlmSkills` is the process-wide, stateless factory. Each run asks it for
//! fresh adapters bound to that run's credential; adapters own their HTTP
//! client and are dropped at the end of the stage.

use std::fmt;
use std::str::FromStr;

use super::ollama::{OllamaClient, OLLAMA_DEFAULT_URL};
use super::openai::{OpenAiClient, OPENAI_DEFAULT_URL};
use super::parser::parse_invoice_response;
use super::prompt::{
    build_extraction_prompt, build_summarization_prompt, build_translation_prompt,
    EXTRACTION_SYSTEM_PROMPT, SUMMARIZATION_SYSTEM_PROMPT, TRANSLATION_SYSTEM_PROMPT,
};
use super::types::{InvoiceExtractor, LlmClient, SkillFactory, Summarizer, Translator};
use super::SkillError;
use crate::models::InvoiceRecord;
use crate::pipeline::credential::Credential;

/// Which text-generation API the skills talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackendKind {
    OpenAi,
    Ollama,
}

impl LlmBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_URL,
            Self::Ollama => OLLAMA_DEFAULT_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Ollama => "llama3",
        }
    }
}

impl FromStr for LlmBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown LLM backend '{other}' (expected openai or ollama)")),
        }
    }
}

impl fmt::Display for LlmBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings shared by every skill.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub backend: LlmBackendKind,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn for_backend(backend: LlmBackendKind) -> Self {
        Self {
            backend,
            base_url: backend.default_url().to_string(),
            model: backend.default_model().to_string(),
            timeout_secs: 120,
        }
    }
}

/// Skill factory backed by a configured LLM.
pub struct LlmSkills {
    settings: LlmSettings,
}

impl LlmSkills {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }

    fn client(&self, credential: &Credential) -> Result<Box<dyn LlmClient + Send + Sync>, SkillError> {
        let s = &self.settings;
        let client: Box<dyn LlmClient + Send + Sync> = match s.backend {
            LlmBackendKind::OpenAi => Box::new(OpenAiClient::new(
                &s.base_url,
                &s.model,
                s.timeout_secs,
                credential,
            )?),
            LlmBackendKind::Ollama => {
                Box::new(OllamaClient::new(&s.base_url, &s.model, s.timeout_secs)?)
            }
        };
        Ok(client)
    }
}

impl SkillFactory for LlmSkills {
    fn extractor(&self, credential: &Credential) -> Result<Box<dyn InvoiceExtractor>, SkillError> {
        Ok(Box::new(LlmExtractor::new(self.client(credential)?)))
    }

    fn translator(
        &self,
        credential: &Credential,
        target_language: &str,
    ) -> Result<Box<dyn Translator>, SkillError> {
        Ok(Box::new(LlmTranslator::new(
            self.client(credential)?,
            target_language,
        )))
    }

    fn summarizer(&self, credential: &Credential) -> Result<Box<dyn Summarizer>, SkillError> {
        Ok(Box::new(LlmSummarizer::new(self.client(credential)?)))
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

pub struct LlmExtractor {
    llm: Box<dyn LlmClient + Send + Sync>,
}

impl LlmExtractor {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }
}

impl InvoiceExtractor for LlmExtractor {
    fn extract(&self, document_text: &str) -> Result<InvoiceRecord, SkillError> {
        let prompt = build_extraction_prompt(document_text);
        let response = self.llm.generate(&prompt, EXTRACTION_SYSTEM_PROMPT)?;
        parse_invoice_response(&response).inspect_err(|e| {
            tracing::warn!(error = %e, response_len = response.len(), "Extraction output rejected");
        })
    }
}

pub struct LlmTranslator {
    llm: Box<dyn LlmClient + Send + Sync>,
    target_language: String,
}

impl LlmTranslator {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, target_language: &str) -> Self {
        Self {
            llm,
            target_language: target_language.to_string(),
        }
    }
}

impl Translator for LlmTranslator {
    fn translate(&self, text: &str) -> Result<String, SkillError> {
        let prompt = build_translation_prompt(text, &self.target_language);
        let response = self.llm.generate(&prompt, TRANSLATION_SYSTEM_PROMPT)?;
        non_empty(response)
    }
}

pub struct LlmSummarizer {
    llm: Box<dyn LlmClient + Send + Sync>,
}

impl LlmSummarizer {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }
}

impl Summarizer for LlmSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SkillError> {
        let prompt = build_summarization_prompt(text);
        let response = self.llm.generate(&prompt, SUMMARIZATION_SYSTEM_PROMPT)?;
        non_empty(response)
    }
}

fn non_empty(response: String) -> Result<String, SkillError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        Err(SkillError::EmptyOutput)
    } else {
        Ok(trimmed.to_string())
    }
}
