//! Recording messaging service for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::slack::service::{MessagingService, UserLookup};

#[derive(Default)]
pub struct StubService {
    users: HashMap<String, String>,
    channels: HashMap<String, String>,
    failing_channels: HashSet<String>,
    pushes: Mutex<Vec<(String, String)>>,
    user_lookups: Mutex<Vec<String>>,
}

impl StubService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.insert(id.to_string(), name.to_string());
        self
    }

    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.insert(id.to_string(), name.to_string());
        self
    }

    pub fn failing_push(mut self, channel_id: &str) -> Self {
        self.failing_channels.insert(channel_id.to_string());
        self
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn user_lookups(&self) -> Vec<String> {
        self.user_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserLookup for StubService {
    async fn user_display_name(&self, user_id: &str) -> Result<String, ChannelError> {
        self.user_lookups.lock().unwrap().push(user_id.to_string());
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ChannelError::LookupFailed {
                id: user_id.to_string(),
                reason: "user_not_found".into(),
            })
    }
}

#[async_trait]
impl MessagingService for StubService {
    async fn push_message(&self, channel_id: &str, text: &str) -> Result<(), ChannelError> {
        if self.failing_channels.contains(channel_id) {
            return Err(ChannelError::SendFailed {
                channel: channel_id.to_string(),
                reason: "not_in_channel".into(),
            });
        }
        self.pushes
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, ChannelError> {
        self.channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| ChannelError::LookupFailed {
                id: channel_id.to_string(),
                reason: "channel_not_found".into(),
            })
    }
}
