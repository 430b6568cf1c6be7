//! Outbound chat operations the router depends on.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;

use super::message::IncomingMessage;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    pub fn request(s: impl Into<String>) -> Self {
        PlatformError::Request(s.into())
    }
}

/// One labelled value in an embed.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Rich message. All text fields hold Telegram HTML and must already be escaped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub image_url: Option<String>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Local>>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn image(mut self, url: Option<String>) -> Self {
        self.image_url = url;
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Local>) -> Self {
        self.timestamp = Some(ts);
        self
    }
}

/// Chat platform seen from the router.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Reply to `msg` in its channel.
    async fn reply(&self, msg: &IncomingMessage, text: &str) -> Result<()>;

    /// Post a rich message to a channel.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<()>;

    /// Put a reaction on `msg`.
    async fn react(&self, msg: &IncomingMessage, emoji: &str) -> Result<()>;

    /// Whether `user_id` may delete other people's messages in `channel_id`.
    async fn can_manage_messages(&self, channel_id: &str, user_id: &str) -> Result<bool>;
}
