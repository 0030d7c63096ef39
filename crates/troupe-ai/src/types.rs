use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Role tag attached to each chat message on the wire.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One turn of a chat-completion conversation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text.into(),
        }
    }
}

/// Errors produced while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("completion API error: {0}")]
    Api(String),
    #[error("unexpected completion response: {0}")]
    UnexpectedShape(String),
}

/// Generates a reply from a persona prompt and the conversation so far.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Requests a single completion. `system_prompt` is sent as the leading
    /// system message, followed by `messages` in order.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, CompletionError>;
}
