pub mod llm;
pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use llm::*;
pub use ollama::*;
pub use openai::*;
pub use parser::*;
pub use types::*;

use thiserror::Error;

/// Longest backend error body or raw model output kept in an error message.
const MAX_ERROR_DETAIL_CHARS: usize = 300;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Provider initialization failed: {0}")]
    Init(String),

    #[error("LLM backend is not reachable at {0}")]
    Connection(String),

    #[error("LLM backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Model returned empty output")]
    EmptyOutput,
}

/// Cut `text` to a bounded, single-line preview for error messages.
pub(crate) fn error_detail(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_ERROR_DETAIL_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
        format!("{cut}...")
    }
}
