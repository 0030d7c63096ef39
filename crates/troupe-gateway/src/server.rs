//! Webhook listener: one POST route, always answered 200.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use troupe_slack::{parse_webhook, WebhookEnvelope};

use crate::dispatcher::Dispatcher;

pub(crate) struct AppState {
    pub(crate) dispatcher: Dispatcher,
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new().route("/", post(handle_webhook)).with_state(state)
}

/// Slack retries any non-200 answer, so every parse or dispatch failure is
/// swallowed into a 200 and reported through the logs instead.
async fn handle_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let envelope = match parse_webhook(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            tracing::warn!(error = %error, "rejecting webhook body");
            return StatusCode::OK.into_response();
        }
    };

    match envelope {
        WebhookEnvelope::UrlVerification { challenge } => {
            (StatusCode::OK, challenge).into_response()
        }
        WebhookEnvelope::EventCallback(callback) => {
            let event_id = callback.event_id.clone();
            match state.dispatcher.dispatch(&callback).await {
                Ok(outcome) => {
                    tracing::debug!(event_id = %event_id, outcome = ?outcome, "dispatch finished");
                }
                Err(error) => {
                    tracing::warn!(event_id = %event_id, error = %error, "dispatch failed");
                    state.dispatcher.note(&event_id, &error.to_string());
                }
            }
            StatusCode::OK.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tempfile::tempdir;
    use troupe_persona::PersonaStore;

    use super::{build_router, AppState};
    use crate::dispatcher::Dispatcher;
    use crate::test_support::{
        aria, test_activity_log, CannedCompletion, MemoryLedger, PanicCompletion, PanicLedger,
        PanicNotifier, RecordingNotifier,
    };

    async fn spawn_server(state: Arc<AppState>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("resolve test listener addr");
        let app = build_router(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        format!("http://{addr}")
    }

    fn inert_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        Arc::new(AppState {
            dispatcher: Dispatcher::new(
                Arc::new(PersonaStore::from_personas(vec![aria()])),
                Arc::new(PanicLedger),
                Arc::new(PanicCompletion),
                Arc::new(PanicNotifier),
                test_activity_log(dir),
            ),
        })
    }

    #[tokio::test]
    async fn functional_url_verification_echoes_challenge() {
        let dir = tempdir().unwrap();
        let base = spawn_server(inert_state(&dir)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .json(&json!({
                "type": "url_verification",
                "token": "verification-token",
                "challenge": "c0ffee-challenge"
            }))
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "c0ffee-challenge");
    }

    #[tokio::test]
    async fn functional_event_callback_is_dispatched_end_to_end() {
        let dir = tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(AppState {
            dispatcher: Dispatcher::new(
                Arc::new(PersonaStore::from_personas(vec![aria()])),
                Arc::new(MemoryLedger::new()),
                Arc::new(CannedCompletion("hello from the troupe")),
                notifier.clone(),
                test_activity_log(&dir),
            ),
        });
        let base = spawn_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .json(&json!({
                "type": "event_callback",
                "api_app_id": "A0TROUPE1",
                "event_id": "Ev0OVERWIRE",
                "authorizations": [{ "user_id": "U0BOT0001" }],
                "event": {
                    "type": "message",
                    "user": "U0HUMAN01",
                    "text": "<@U0BOT0001> say hi",
                    "channel": "C0GENERAL"
                }
            }))
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 200);
        let deliveries = notifier.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].text, "hello from the troupe");
    }

    #[tokio::test]
    async fn functional_malformed_body_still_returns_ok() {
        let dir = tempdir().unwrap();
        let base = spawn_server(inert_state(&dir)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .body("not even json")
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn functional_unknown_envelope_type_still_returns_ok() {
        let dir = tempdir().unwrap();
        let base = spawn_server(inert_state(&dir)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .json(&json!({ "type": "app_rate_limited" }))
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn functional_non_post_method_is_rejected() {
        let dir = tempdir().unwrap();
        let base = spawn_server(inert_state(&dir)).await;

        let response = reqwest::Client::new()
            .get(format!("{base}/"))
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 405);
    }

    #[tokio::test]
    async fn regression_dispatch_failure_is_logged_and_answered_ok() {
        let dir = tempdir().unwrap();
        let activity = test_activity_log(&dir);
        let state = Arc::new(AppState {
            dispatcher: Dispatcher::new(
                Arc::new(PersonaStore::from_personas(vec![aria()])),
                Arc::new(MemoryLedger::new()),
                Arc::new(PanicCompletion),
                Arc::new(PanicNotifier),
                activity.clone(),
            ),
        });
        let base = spawn_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .json(&json!({
                "type": "event_callback",
                "api_app_id": "A0SOMEONE",
                "event_id": "Ev0NOBODY1",
                "authorizations": [{ "user_id": "U0BOT0001" }],
                "event": {
                    "type": "message",
                    "user": "U0HUMAN01",
                    "text": "hello?",
                    "channel": "C0GENERAL"
                }
            }))
            .send()
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), 200);
        let log = std::fs::read_to_string(activity.path()).unwrap();
        assert!(log.contains("(Ev0NOBODY1) no persona configured for app id 'A0SOMEONE'"));
    }
}
