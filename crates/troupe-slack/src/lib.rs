//! Slack-facing surface: typed webhook payloads in, Web API delivery out.

mod client;
mod events;

pub use client::{
    DeliveryError, NotificationClient, SlackClient, SlackConfig, DEFAULT_SLACK_API_BASE,
};
pub use events::{
    parse_webhook, Authorization, BotProfile, CallbackEvent, EventCallback, MalformedPayload,
    MessageEvent, WebhookEnvelope,
};
