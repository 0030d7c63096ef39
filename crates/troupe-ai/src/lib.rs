//! Chat-completion client used to generate persona replies.
//!
//! [`CompletionClient`] is the seam the dispatcher talks through;
//! [`OpenAiClient`] is the production implementation speaking the OpenAI
//! chat-completions wire format.

mod openai;
mod types;

pub use openai::{OpenAiClient, OpenAiConfig, DEFAULT_COMPLETION_MODEL, DEFAULT_OPENAI_API_BASE};
pub use types::{CompletionClient, CompletionError, Message, MessageRole};
