//! Platform-neutral inbound messages.

use regex::Regex;
use std::sync::OnceLock;

/// A chat user as seen by the router.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRef {
    pub id: String,
    pub display_name: String,
    pub is_bot: bool,
}

impl UserRef {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            is_bot: false,
        }
    }
}

/// A file attached to a message.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    /// Link that opens the attachment.
    pub url: String,
    pub name: Option<String>,
    /// MIME type, when the platform reports one.
    pub content_type: Option<String>,
}

fn image_extension_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$").ok())
        .as_ref()
}

impl Attachment {
    /// Whether this attachment counts as image evidence.
    pub fn is_image(&self) -> bool {
        if self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/"))
        {
            return true;
        }
        let Some(re) = image_extension_re() else {
            return false;
        };
        self.name.as_deref().is_some_and(|n| re.is_match(n)) || re.is_match(&self.url)
    }
}

/// An inbound chat message.
///
/// User mentions inside `content` are normalized to `<@id>` tokens and the
/// mentioned users are listed, in order, in `mentions`.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub id: String,
    pub channel_id: String,
    pub author: UserRef,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub mentions: Vec<UserRef>,
    /// Shared by the messages of one photo album.
    pub album_id: Option<String>,
}

impl IncomingMessage {
    pub fn images(&self) -> Vec<&Attachment> {
        self.attachments.iter().filter(|a| a.is_image()).collect()
    }
}
