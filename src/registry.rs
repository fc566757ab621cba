//! Channel registry — the static set of Slack channels kept in sync.
//!
//! Loaded once at startup from a JSON array of `{ "id": ..., "name": ... }`
//! records. Order matters: the document layout follows registry order.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// A synchronized channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    /// Slack channel id, e.g. `C0123ABCD`.
    pub id: String,
    /// Logical name used in section headers.
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ordered, immutable set of channels with unique ids and names.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Build a registry, rejecting empty input and duplicate ids or names.
    pub fn new(channels: Vec<Channel>) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "channels".into(),
                message: "must contain at least one channel".into(),
            });
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for channel in &channels {
            if channel.id.trim().is_empty() || channel.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "channels".into(),
                    message: "every channel needs a non-empty id and name".into(),
                });
            }
            if !ids.insert(channel.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "channels".into(),
                    message: format!("duplicate channel id {}", channel.id),
                });
            }
            if !names.insert(channel.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "channels".into(),
                    message: format!("duplicate channel name {}", channel.name),
                });
            }
        }

        Ok(Self { channels })
    }

    /// Parse a registry from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let channels: Vec<Channel> =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::new(channels)
    }

    /// Load the registry file. A missing file is reported with a setup hint.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingRequired {
                key: path.display().to_string(),
                hint: "Copy channels.example.json to channels.json and configure your channels."
                    .into(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Look up a channel by its Slack id.
    pub fn by_id(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }
}
