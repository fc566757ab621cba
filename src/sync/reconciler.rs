//! Outbound reconciler — pushes changed WRITE sections to their channels.
//!
//! WRITE sections are never cleared after a push. The document keeps the
//! last intended message and the dedup tracker makes re-reading it a no-op.

use std::sync::Arc;

use crate::document::{DocumentStore, SectionKey};
use crate::registry::ChannelRegistry;
use crate::slack::MessagingService;
use crate::sync::dedup::DedupTracker;

/// Number of characters of pushed content echoed in the log.
const LOG_PREVIEW_CHARS: usize = 50;

/// Channels touched by one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Channel ids that received a push.
    pub pushed: Vec<String>,
    /// Channel ids whose push failed.
    pub failed: Vec<String>,
}

pub struct OutboundReconciler {
    registry: Arc<ChannelRegistry>,
    store: Arc<DocumentStore>,
    service: Arc<dyn MessagingService>,
    dedup: DedupTracker,
}

impl OutboundReconciler {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        store: Arc<DocumentStore>,
        service: Arc<dyn MessagingService>,
    ) -> Self {
        Self {
            registry,
            store,
            service,
            dedup: DedupTracker::new(),
        }
    }

    pub fn dedup(&self) -> &DedupTracker {
        &self.dedup
    }

    /// Run one reconciliation pass over every registered channel.
    ///
    /// A failed push is logged and skipped; it is retried on the next tick
    /// because nothing was recorded for it.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for channel in self.registry.iter() {
            let sections = self.store.read_all().await;
            let body = sections.body(&SectionKey::write(&channel.name));

            if !self.dedup.should_push(&channel.id, body) {
                continue;
            }

            match self.service.push_message(&channel.id, body).await {
                Ok(()) => {
                    self.dedup.record(&channel.id, body);
                    tracing::info!(
                        channel = %channel.name,
                        preview = %preview(body),
                        "Posted WRITE section"
                    );
                    report.pushed.push(channel.id.clone());
                }
                Err(e) => {
                    tracing::error!(
                        channel = %channel.name,
                        error = %e,
                        "Failed to post WRITE section"
                    );
                    report.failed.push(channel.id.clone());
                }
            }
        }

        report
    }
}

fn preview(body: &str) -> String {
    let mut preview: String = body.chars().take(LOG_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
