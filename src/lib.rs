//! Ravel — keeps a sectioned text document in sync with Slack channels.

pub mod config;
pub mod document;
pub mod error;
pub mod registry;
pub mod slack;
pub mod sync;
