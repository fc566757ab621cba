//! Inbound mapper — turns Slack events into lines of the READ and
//! MENTIONS sections.

use std::sync::Arc;

use chrono::DateTime;

use crate::document::{DocumentStore, SectionKey};
use crate::registry::ChannelRegistry;
use crate::slack::service::{channel_name_or_id, user_name_or_id};
use crate::slack::{MessageEvent, MessagingService, SlackEvent};
use crate::sync::decorate::decorate_mentions;

/// Display value for events without a sender.
const UNKNOWN_SENDER: &str = "unknown";

/// Why an event produced no line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Subtyped,
    UnknownChannel,
    InvalidTimestamp,
    Unsupported,
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// A line was formatted and the append was attempted.
    Appended { section: SectionKey, line: String },
    Skipped(SkipReason),
}

pub struct InboundMapper {
    registry: Arc<ChannelRegistry>,
    store: Arc<DocumentStore>,
    service: Arc<dyn MessagingService>,
    enabled: bool,
}

impl InboundMapper {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        store: Arc<DocumentStore>,
        service: Arc<dyn MessagingService>,
        enabled: bool,
    ) -> Self {
        Self {
            registry,
            store,
            service,
            enabled,
        }
    }

    /// Dispatch one Slack event. Never fails; problems are logged.
    pub async fn handle(&self, event: &SlackEvent) -> InboundOutcome {
        match event {
            SlackEvent::Message(msg) => self.handle_message(msg).await,
            SlackEvent::AppMention(msg) => self.handle_mention(msg).await,
            SlackEvent::Other => InboundOutcome::Skipped(SkipReason::Unsupported),
        }
    }

    /// Plain channel message → `read:<channel>`.
    pub async fn handle_message(&self, event: &MessageEvent) -> InboundOutcome {
        if !self.enabled {
            return InboundOutcome::Skipped(SkipReason::Disabled);
        }
        if event.subtype.is_some() {
            return InboundOutcome::Skipped(SkipReason::Subtyped);
        }
        let Some(channel) = self.registry.by_id(&event.channel) else {
            return InboundOutcome::Skipped(SkipReason::UnknownChannel);
        };
        let Some(timestamp) = format_timestamp(&event.ts) else {
            tracing::warn!(
                channel = %channel.name,
                ts = %event.ts,
                "Dropping message with invalid timestamp"
            );
            return InboundOutcome::Skipped(SkipReason::InvalidTimestamp);
        };

        let sender = self.sender_name(event).await;
        let text = self.text(event).await;
        let line = format!("[{timestamp}] @{sender}: {text}");

        self.append(SectionKey::read(&channel.name), line).await
    }

    /// Mention of the bot in any channel → `mentions`.
    pub async fn handle_mention(&self, event: &MessageEvent) -> InboundOutcome {
        if !self.enabled {
            return InboundOutcome::Skipped(SkipReason::Disabled);
        }
        let Some(timestamp) = format_timestamp(&event.ts) else {
            tracing::warn!(
                channel = %event.channel,
                ts = %event.ts,
                "Dropping mention with invalid timestamp"
            );
            return InboundOutcome::Skipped(SkipReason::InvalidTimestamp);
        };

        let sender = self.sender_name(event).await;
        let channel_name = channel_name_or_id(&*self.service, &event.channel).await;
        let text = self.text(event).await;
        let line = format!("[{timestamp}] #{channel_name}: @{sender}: {text}");

        self.append(SectionKey::mentions(), line).await
    }

    async fn sender_name(&self, event: &MessageEvent) -> String {
        match event.user.as_deref() {
            Some(user) => user_name_or_id(&*self.service, user).await,
            None => UNKNOWN_SENDER.to_string(),
        }
    }

    async fn text(&self, event: &MessageEvent) -> String {
        let raw = event.text.as_deref().unwrap_or_default();
        decorate_mentions(&*self.service, raw).await
    }

    async fn append(&self, section: SectionKey, line: String) -> InboundOutcome {
        match self.store.append_to_section(&section, &line).await {
            Ok(()) => tracing::info!(section = %section, line = %line, "Appended inbound line"),
            Err(e) => {
                tracing::error!(section = %section, error = %e, "Failed to append inbound line")
            }
        }
        InboundOutcome::Appended { section, line }
    }
}

/// Format Slack's `"<secs>.<fraction>"` timestamp as `YYYY-MM-DD HH:MM:SS`
/// in UTC, truncating the fraction.
pub fn format_timestamp(ts: &str) -> Option<String> {
    let seconds: f64 = ts.trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    let datetime = DateTime::from_timestamp(seconds.floor() as i64, 0)?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
