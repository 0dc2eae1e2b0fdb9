//! Chat-completions backend over HTTP.
//!
//! Sends `{ model, messages: [system, user], temperature }` as an
//! authenticated POST and reads the text from `choices[0].message.content`.
//! HTTP 429 is reported as [`BackendError::Throttled`]; any other non-success
//! status is an API error the client treats as transient.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::request::GenerationRequest;
use super::{BackendError, GenerationBackend};
use crate::config::GenerationConfig;
use crate::logutil::prompt_preview;

const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_text(response: ChatResponse) -> Result<String, BackendError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BackendError::Parse("response has no choices[0].message.content".into()))
}

#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
        })
    }

    /// Build from configuration, resolving the key from the config or environment.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, BackendError> {
        let key = config.resolve_api_key().ok_or_else(|| {
            BackendError::NotConfigured(format!(
                "no API key in config or ${}",
                config.api_key_env
            ))
        })?;
        Self::new(config, key)
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let prompt = request.prompt();
        debug!(
            "POST {} ({} request): {}",
            self.api_url,
            request.kind(),
            prompt_preview(&prompt)
        );
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == STATUS_TOO_MANY_REQUESTS {
            return Err(BackendError::Throttled);
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        first_choice_text(parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
