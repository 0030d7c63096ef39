#![no_main]

use libfuzzer_sys::fuzz_target;
use troupe_slack::{parse_webhook, CallbackEvent, WebhookEnvelope};

fuzz_target!(|data: &[u8]| {
    let envelope = match parse_webhook(data) {
        Ok(envelope) => envelope,
        Err(error) => {
            assert!(error.to_string().starts_with("malformed webhook payload"));
            return;
        }
    };

    // Accessors must answer every parseable envelope without panicking.
    match envelope {
        WebhookEnvelope::UrlVerification { challenge } => {
            let _ = challenge.len();
        }
        WebhookEnvelope::EventCallback(callback) => {
            let _ = callback.bot_user_id();
            if let CallbackEvent::Message(message) = &callback.event {
                let _ = message.speaker();
                let _ = message.text();
                let _ = message.channel();
                let _ = message.thread_ts();
            }
        }
    }
});
