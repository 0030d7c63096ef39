//! Typed view of the Slack Events API webhook payload.
//!
//! The envelope is parsed up front into these types; anything the gateway
//! later needs is exposed through accessors that report a missing field as
//! [`MalformedPayload`] instead of handing out half-filled data.

use serde::Deserialize;
use thiserror::Error;

/// A webhook body that cannot be understood.
#[derive(Debug, Error)]
#[error("malformed webhook payload: {detail}")]
pub struct MalformedPayload {
    detail: String,
}

impl MalformedPayload {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(format!("missing field `{field}`"))
    }
}

/// Parses a raw webhook body into the typed envelope.
///
/// Unrecognized outer `type` values fail here; unrecognized inner event
/// types parse as [`CallbackEvent::Unknown`] so they can still be marked in
/// the ledger.
pub fn parse_webhook(body: &[u8]) -> Result<WebhookEnvelope, MalformedPayload> {
    serde_json::from_slice(body).map_err(|error| MalformedPayload::new(error.to_string()))
}

/// Outer webhook envelope, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookEnvelope {
    UrlVerification { challenge: String },
    EventCallback(EventCallback),
}

/// The `event_callback` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventCallback {
    pub api_app_id: String,
    pub event_id: String,
    #[serde(default)]
    authorizations: Vec<Authorization>,
    pub event: CallbackEvent,
}

impl EventCallback {
    /// The receiving bot's own platform user id, taken from the first
    /// authorization entry.
    pub fn bot_user_id(&self) -> Result<&str, MalformedPayload> {
        self.authorizations
            .first()
            .map(|authorization| authorization.user_id.as_str())
            .ok_or_else(|| MalformedPayload::missing_field("authorizations[0].user_id"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    user_id: String,
}

/// Inner event, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackEvent {
    Message(MessageEvent),
    #[serde(other)]
    Unknown,
}

/// A channel message. Slack omits fields freely across message subtypes, so
/// everything is optional at parse time and required at access time.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    bot_profile: Option<BotProfile>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotProfile {
    name: String,
}

impl MessageEvent {
    /// Display identity of the sender: the bot profile name when another bot
    /// spoke, the raw user id otherwise.
    pub fn speaker(&self) -> Result<&str, MalformedPayload> {
        if let Some(bot_profile) = &self.bot_profile {
            return Ok(&bot_profile.name);
        }
        self.user
            .as_deref()
            .ok_or_else(|| MalformedPayload::missing_field("event.user"))
    }

    pub fn text(&self) -> Result<&str, MalformedPayload> {
        self.text
            .as_deref()
            .ok_or_else(|| MalformedPayload::missing_field("event.text"))
    }

    pub fn channel(&self) -> Result<&str, MalformedPayload> {
        self.channel
            .as_deref()
            .ok_or_else(|| MalformedPayload::missing_field("event.channel"))
    }

    pub fn thread_ts(&self) -> Option<&str> {
        self.thread_ts.as_deref()
    }
}
