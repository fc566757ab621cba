//! Capabilities the sync engine needs from the remote messaging service.

use async_trait::async_trait;

use crate::error::ChannelError;

/// Resolves user ids to display names.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn user_display_name(&self, user_id: &str) -> Result<String, ChannelError>;
}

/// Remote messaging service used by the reconciler and the inbound mapper.
#[async_trait]
pub trait MessagingService: UserLookup {
    /// Post plain text to a channel.
    async fn push_message(&self, channel_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Resolve a channel id to its name.
    async fn channel_name(&self, channel_id: &str) -> Result<String, ChannelError>;
}

/// Resolve a user name, falling back to the raw id on failure.
pub async fn user_name_or_id<L: UserLookup + ?Sized>(lookup: &L, user_id: &str) -> String {
    match lookup.user_display_name(user_id).await {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => user_id.to_string(),
        Err(e) => {
            tracing::warn!(user = %user_id, error = %e, "User lookup failed");
            user_id.to_string()
        }
    }
}

/// Resolve a channel name, falling back to the raw id on failure.
pub async fn channel_name_or_id<S: MessagingService + ?Sized>(
    service: &S,
    channel_id: &str,
) -> String {
    match service.channel_name(channel_id).await {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => channel_id.to_string(),
        Err(e) => {
            tracing::warn!(channel = %channel_id, error = %e, "Channel lookup failed");
            channel_id.to_string()
        }
    }
}
