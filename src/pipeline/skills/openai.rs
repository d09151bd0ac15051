//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! The run's credential becomes a bearer token baked into the client's
//! default headers at construction, so it is never stored as plain text on
//! the client and never logged.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::types::LlmClient;
use super::{error_detail, SkillError};
use crate::pipeline::credential::Credential;

pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        timeout_secs: u64,
        credential: &Credential,
    ) -> Result<Self, SkillError> {
        if credential.is_blank() {
            return Err(SkillError::Init("API credential is empty".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_header(credential)?);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SkillError::Init(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }
}

/// Sensitive `Authorization` value. The intermediate text is wiped on drop.
fn bearer_header(credential: &Credential) -> Result<HeaderValue, SkillError> {
    let bearer = Zeroizing::new(format!("Bearer {}", credential.expose()));
    let mut auth = HeaderValue::from_str(&bearer).map_err(|_| {
        SkillError::Init("API credential contains characters not allowed in a header".into())
    })?;
    auth.set_sensitive(true);
    Ok(auth)
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, SkillError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system.trim(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    SkillError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    SkillError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    SkillError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SkillError::Backend {
                status: status.as_u16(),
                body: error_detail(&body),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| SkillError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(SkillError::EmptyOutput)
    }
}
