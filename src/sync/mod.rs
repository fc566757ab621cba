//! Two-way synchronization between the document and Slack.

pub mod decorate;
pub mod dedup;
pub mod engine;
pub mod inbound;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod stub;

pub use decorate::decorate_mentions;
pub use dedup::DedupTracker;
pub use engine::SyncEngine;
pub use inbound::{InboundMapper, InboundOutcome, SkipReason, format_timestamp};
pub use reconciler::{OutboundReconciler, TickReport};
