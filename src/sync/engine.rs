//! The single event loop that drives both directions of the sync.
//!
//! Inbound events and reconciliation ticks are handled one at a time, each
//! awaited to completion before the next is taken. That serialization is
//! what lets the document store do unlocked read-modify-write updates.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::slack::SlackEvent;
use crate::sync::inbound::InboundMapper;
use crate::sync::reconciler::OutboundReconciler;

pub struct SyncEngine {
    mapper: InboundMapper,
    reconciler: OutboundReconciler,
    interval: Duration,
}

impl SyncEngine {
    pub fn new(mapper: InboundMapper, reconciler: OutboundReconciler, interval: Duration) -> Self {
        Self {
            mapper,
            reconciler,
            interval,
        }
    }

    /// Run until `shutdown` resolves.
    ///
    /// If the event feed closes, outbound reconciliation keeps running.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SlackEvent>,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip immediate first tick
        ticker.tick().await;

        tokio::pin!(shutdown);
        let mut feed_open = true;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Sync engine shutting down");
                    break;
                }
                // Ticks ahead of events so a busy feed cannot starve outbound sync
                _ = ticker.tick() => {
                    let report = self.reconciler.tick().await;
                    if !report.failed.is_empty() {
                        tracing::debug!(failed = ?report.failed, "Tick finished with failures");
                    }
                }
                event = events.recv(), if feed_open => match event {
                    Some(event) => {
                        self.mapper.handle(&event).await;
                    }
                    None => {
                        tracing::warn!("Slack event feed closed; continuing outbound sync only");
                        feed_open = false;
                    }
                },
            }
        }
    }
}
