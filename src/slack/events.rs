//! Slack event payloads consumed by the inbound mapper.

use serde::Deserialize;

/// Shape shared by `message` and `app_mention` events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageEvent {
    pub channel: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Epoch seconds with a fractional part, e.g. `"1700000000.000100"`.
    pub ts: String,
    /// Present on edits, deletes, bot posts and other non-plain messages.
    #[serde(default)]
    pub subtype: Option<String>,
}

impl MessageEvent {
    pub fn new(channel: &str, user: &str, text: &str, ts: &str) -> Self {
        Self {
            channel: channel.to_string(),
            user: Some(user.to_string()),
            text: Some(text.to_string()),
            ts: ts.to_string(),
            subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = Some(subtype.to_string());
        self
    }
}

/// Inner event of an `events_api` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    Message(MessageEvent),
    AppMention(MessageEvent),
    #[serde(other)]
    Other,
}
