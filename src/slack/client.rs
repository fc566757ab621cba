//! Slack Web API client.
//!
//! Only the handful of methods the bridge needs: `chat.postMessage`,
//! `users.info`, `conversations.info` and `auth.test`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::ChannelError;
use crate::slack::service::{MessagingService, UserLookup};

/// Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    bot_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(bot_token: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            bot_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    /// GET a read method with query parameters.
    async fn get(&self, method: &str, query: &[(&str, &str)]) -> Result<Value, ChannelError> {
        let resp = self
            .client
            .get(self.api_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;
        parse_response(method, resp).await
    }

    /// POST a JSON body to a write method.
    async fn post(&self, method: &str, body: &Value) -> Result<Value, ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;
        parse_response(method, resp).await
    }

    /// Verify the bot token. Returns the bot's user id.
    pub async fn health_check(&self) -> Result<String, ChannelError> {
        let data = self
            .post("auth.test", &serde_json::json!({}))
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "slack".into(),
                reason: e.to_string(),
            })?;
        Ok(data
            .get("user_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Slack answers most failures with HTTP 200 and `"ok": false`.
async fn parse_response(method: &str, resp: reqwest::Response) -> Result<Value, ChannelError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ChannelError::Http(format!("{method} returned {status}: {body}")));
    }
    let data: Value = resp
        .json()
        .await
        .map_err(|e| ChannelError::InvalidMessage(format!("{method}: {e}")))?;
    check_ok(method, data)
}

fn check_ok(method: &str, data: Value) -> Result<Value, ChannelError> {
    if data.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(data);
    }
    let error = data
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    Err(ChannelError::Http(format!("{method} failed: {error}")))
}

/// Prefer the real name, then the handle.
fn display_name_from(data: &Value) -> Option<String> {
    let user = data.get("user")?;
    ["real_name", "name"]
        .iter()
        .filter_map(|field| user.get(*field).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .map(String::from)
}

fn channel_name_from(data: &Value) -> Option<String> {
    data.get("channel")
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(String::from)
}

#[async_trait]
impl UserLookup for SlackClient {
    async fn user_display_name(&self, user_id: &str) -> Result<String, ChannelError> {
        let data = self
            .get("users.info", &[("user", user_id)])
            .await
            .map_err(|e| ChannelError::LookupFailed {
                id: user_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(display_name_from(&data).unwrap_or_else(|| user_id.to_string()))
    }
}

#[async_trait]
impl MessagingService for SlackClient {
    async fn push_message(&self, channel_id: &str, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "channel": channel_id,
            "text": text,
        });
        self.post("chat.postMessage", &body)
            .await
            .map_err(|e| ChannelError::SendFailed {
                channel: channel_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, ChannelError> {
        let data = self
            .get("conversations.info", &[("channel", channel_id)])
            .await
            .map_err(|e| ChannelError::LookupFailed {
                id: channel_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(channel_name_from(&data).unwrap_or_else(|| channel_id.to_string()))
    }
}
