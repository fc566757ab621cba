//! Socket Mode listener — receives Slack events over a WebSocket.
//!
//! `apps.connections.open` hands out a short-lived `wss://` URL. Every
//! envelope carrying an `envelope_id` must be acknowledged by echoing the id
//! back; `events_api` envelopes carry the event we forward. Slack rotates
//! connections by sending a `disconnect` envelope, after which we reconnect.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::slack::events::SlackEvent;

/// Base delay before reconnecting after a dropped connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound of the random jitter added to the reconnect delay.
const RECONNECT_JITTER_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
}

/// What to do in response to one Socket Mode frame.
#[derive(Debug, Default, PartialEq)]
struct EnvelopeAction {
    ack: Option<String>,
    event: Option<SlackEvent>,
    reconnect: bool,
}

fn handle_envelope(text: &str) -> EnvelopeAction {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed Socket Mode frame");
            return EnvelopeAction::default();
        }
    };

    let ack = envelope
        .envelope_id
        .map(|id| serde_json::json!({ "envelope_id": id }).to_string());

    match envelope.kind.as_str() {
        "hello" => {
            info!("Slack Socket Mode connected");
            EnvelopeAction { ack, ..Default::default() }
        }
        "disconnect" => {
            info!("Slack requested reconnect");
            EnvelopeAction {
                ack,
                reconnect: true,
                ..Default::default()
            }
        }
        "events_api" => {
            let event = envelope
                .payload
                .and_then(|mut p| p.get_mut("event").map(Value::take))
                .and_then(|raw| match serde_json::from_value::<SlackEvent>(raw) {
                    Ok(SlackEvent::Other) => None,
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!(error = %e, "Ignoring undecodable Slack event");
                        None
                    }
                });
            EnvelopeAction {
                ack,
                event,
                reconnect: false,
            }
        }
        other => {
            debug!(kind = %other, "Ignoring Socket Mode envelope");
            EnvelopeAction { ack, ..Default::default() }
        }
    }
}

/// Ask Slack for a fresh Socket Mode WebSocket URL.
async fn open_connection(
    client: &reqwest::Client,
    api_base: &str,
    app_token: &SecretString,
) -> Result<String, ChannelError> {
    let resp = client
        .post(format!("{api_base}/apps.connections.open"))
        .bearer_auth(app_token.expose_secret())
        .send()
        .await
        .map_err(|e| ChannelError::StartupFailed {
            name: "slack".into(),
            reason: e.to_string(),
        })?;

    let data: Value = resp.json().await.map_err(|e| ChannelError::StartupFailed {
        name: "slack".into(),
        reason: e.to_string(),
    })?;

    if data.get("ok").and_then(Value::as_bool) != Some(true) {
        return Err(ChannelError::StartupFailed {
            name: "slack".into(),
            reason: format!(
                "apps.connections.open failed: {}",
                data.get("error").and_then(Value::as_str).unwrap_or("unknown_error")
            ),
        });
    }

    data.get("url")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ChannelError::InvalidMessage("apps.connections.open: missing url".into()))
}

/// Outcome of one WebSocket session.
enum SessionEnd {
    Reconnect,
    ReceiverClosed,
}

/// Run one connection until it drops or Slack asks us to reconnect.
async fn run_session(
    url: &str,
    tx: &mpsc::UnboundedSender<SlackEvent>,
) -> Result<SessionEnd, ChannelError> {
    let (mut ws, _) = connect_async(url)
        .await
        .map_err(|e| ChannelError::Disconnected {
            name: "slack".into(),
            reason: e.to_string(),
        })?;

    while let Some(frame) = ws.next().await {
        let frame = frame.map_err(|e| ChannelError::Disconnected {
            name: "slack".into(),
            reason: e.to_string(),
        })?;

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(SessionEnd::Reconnect),
            _ => continue,
        };

        let action = handle_envelope(text.as_str());

        if let Some(ack) = action.ack
            && let Err(e) = ws.send(Message::text(ack)).await
        {
            return Err(ChannelError::Disconnected {
                name: "slack".into(),
                reason: e.to_string(),
            });
        }

        if let Some(event) = action.event
            && tx.send(event).is_err()
        {
            return Ok(SessionEnd::ReceiverClosed);
        }

        if action.reconnect {
            let _ = ws.close(None).await;
            return Ok(SessionEnd::Reconnect);
        }
    }

    Ok(SessionEnd::Reconnect)
}

/// Spawn the Socket Mode listener. Decoded events are sent to `tx` in
/// arrival order; the task exits once the receiver is dropped.
pub fn spawn_socket_listener(
    app_token: SecretString,
    api_base: String,
    tx: mpsc::UnboundedSender<SlackEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let api_base = api_base.trim_end_matches('/').to_string();

        loop {
            match open_connection(&client, &api_base, &app_token).await {
                Ok(url) => match run_session(&url, &tx).await {
                    Ok(SessionEnd::ReceiverClosed) => {
                        info!("Slack event receiver closed; stopping listener");
                        return;
                    }
                    Ok(SessionEnd::Reconnect) => {
                        debug!("Slack Socket Mode session ended");
                    }
                    Err(e) => warn!(error = %e, "Slack Socket Mode session failed"),
                },
                Err(e) => warn!(error = %e, "Failed to open Slack Socket Mode connection"),
            }

            if tx.is_closed() {
                return;
            }

            let jitter = rand::thread_rng().gen_range(0..RECONNECT_JITTER_MS);
            tokio::time::sleep(RECONNECT_DELAY + Duration::from_millis(jitter)).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::events::MessageEvent;

    #[test]
    fn hello_is_not_acked_without_id() {
        let action = handle_envelope(r#"{"type":"hello","num_connections":1}"#);
        assert_eq!(action, EnvelopeAction::default());
    }

    #[test]
    fn events_api_is_acked_and_forwarded() {
        let frame = serde_json::json!({
            "envelope_id": "env-1",
            "type": "events_api",
            "payload": {
                "event": {
                    "type": "message",
                    "channel": "C1",
                    "user": "U1",
                    "text": "hi",
                    "ts": "1700000000.0"
                }
            }
        })
        .to_string();

        let action = handle_envelope(&frame);
        assert_eq!(action.ack.as_deref(), Some(r#"{"envelope_id":"env-1"}"#));
        assert_eq!(
            action.event,
            Some(SlackEvent::Message(MessageEvent::new("C1", "U1", "hi", "1700000000.0")))
        );
        assert!(!action.reconnect);
    }

    #[test]
    fn unhandled_event_types_are_acked_but_dropped() {
        let frame = serde_json::json!({
            "envelope_id": "env-2",
            "type": "events_api",
            "payload": { "event": { "type": "reaction_added" } }
        })
        .to_string();

        let action = handle_envelope(&frame);
        assert!(action.ack.is_some());
        assert!(action.event.is_none());
    }

    #[test]
    fn disconnect_requests_reconnect() {
        let action = handle_envelope(r#"{"type":"disconnect","reason":"refresh_requested"}"#);
        assert!(action.reconnect);
    }

    #[test]
    fn garbage_frames_are_ignored() {
        assert_eq!(handle_envelope("not json"), EnvelopeAction::default());
    }
}
