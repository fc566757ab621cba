//! Slack integration: the messaging service seam, the Web API client, and
//! the Socket Mode event feed.

pub mod client;
pub mod events;
pub mod service;
pub mod socket;

pub use client::SlackClient;
pub use events::{MessageEvent, SlackEvent};
pub use service::{MessagingService, UserLookup};
pub use socket::spawn_socket_listener;
