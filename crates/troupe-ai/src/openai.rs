//! OpenAI chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{CompletionClient, CompletionError, Message};

/// Public endpoint used when no override is configured.
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Model requested when the deployment does not pick one.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// Generation parameters are fixed; persona voice comes entirely from the
// system prompt.
const COMPLETION_TEMPERATURE: f64 = 1.0;
const COMPLETION_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: String::new(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|error| CompletionError::InvalidApiKey(error.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self { client, config })
    }

    fn chat_completions_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, CompletionError> {
        let body = build_completion_body(&self.config.model, system_prompt, messages);
        let response = self
            .client
            .post(self.chat_completions_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            // Failures usually arrive as a structured error body; surface the
            // upstream message when one is present.
            if let Some(message) = parse_api_error(&raw) {
                return Err(CompletionError::Api(message));
            }
            return Err(CompletionError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_completion_text(&raw)
    }
}

fn build_completion_body(model: &str, system_prompt: &str, messages: &[Message]) -> Value {
    let system = Message::system(system_prompt);
    let mut turns: Vec<&Message> = Vec::with_capacity(messages.len() + 1);
    turns.push(&system);
    turns.extend(messages.iter());

    json!({
        "model": model,
        "messages": turns,
        "temperature": COMPLETION_TEMPERATURE,
        "max_tokens": COMPLETION_MAX_TOKENS,
        "frequency_penalty": 0,
        "presence_penalty": 0,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    error: Option<ApiErrorBody>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn parse_api_error(raw: &str) -> Option<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(raw).ok()?;
    parsed.error.map(|error| error.message)
}

fn parse_completion_text(raw: &str) -> Result<String, CompletionError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(raw)
        .map_err(|error| CompletionError::UnexpectedShape(error.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(CompletionError::Api(error.message));
    }

    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
        CompletionError::UnexpectedShape("response contained no choices".to_string())
    })?;

    choice.message.content.ok_or_else(|| {
        CompletionError::UnexpectedShape("choice message carried no content".to_string())
    })
}
