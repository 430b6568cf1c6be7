//! Conversion of Telegram messages into router messages.

use teloxide::types::{FileMeta, Message, MessageEntityKind, User};

use crate::core::routing::mention_token;
use crate::core::{Attachment, IncomingMessage, UserRef};

fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.0.to_string(),
        display_name: user.full_name(),
        is_bot: user.is_bot,
    }
}

/// Convert a Telegram message. Returns `None` for messages without a sender
/// (channel posts, service messages).
pub fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let author = msg.from.as_ref().map(user_ref)?;
    let (content, mut mentions) = normalize_mentions(msg);

    // Replying to someone's message counts as mentioning them. Forum topic
    // posts carry the topic-creation message as their reply target.
    if mentions.is_empty() {
        if let Some(replied) = msg
            .reply_to_message()
            .filter(|m| m.forum_topic_created().is_none())
            .and_then(|m| m.from.as_ref())
        {
            mentions.push(user_ref(replied));
        }
    }

    Some(IncomingMessage {
        id: msg.id.0.to_string(),
        channel_id: msg.chat.id.0.to_string(),
        author,
        content,
        attachments: attachments(msg),
        mentions,
        album_id: msg.media_group_id().map(|id| id.to_string()),
    })
}

/// Replace `text_mention` entities with `<@id>` tokens.
///
/// Plain `@username` mentions carry no user id and are left as text.
fn normalize_mentions(msg: &Message) -> (String, Vec<UserRef>) {
    let text = msg.text().or_else(|| msg.caption()).unwrap_or("");
    let entities = msg
        .parse_entities()
        .or_else(|| msg.parse_caption_entities())
        .unwrap_or_default();

    let mut content = String::with_capacity(text.len());
    let mut mentions = Vec::new();
    let mut cursor = 0;
    for entity in &entities {
        let MessageEntityKind::TextMention { user } = entity.kind() else {
            continue;
        };
        let range = entity.range();
        if range.start < cursor {
            continue;
        }
        content.push_str(&text[cursor..range.start]);
        content.push(' ');
        content.push_str(&mention_token(&user.id.0.to_string()));
        content.push(' ');
        mentions.push(user_ref(user));
        cursor = range.end;
    }
    content.push_str(&text[cursor..]);

    (content, mentions)
}

/// Collect the photo and document of a message as attachments.
fn attachments(msg: &Message) -> Vec<Attachment> {
    let mut out = Vec::new();

    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        out.push(Attachment {
            url: attachment_url(msg, &photo.file),
            name: Some(format!("photo_{}.jpg", msg.id.0)),
            content_type: Some("image/jpeg".to_string()),
        });
    }

    if let Some(doc) = msg.document() {
        out.push(Attachment {
            url: attachment_url(msg, &doc.file),
            name: doc.file_name.clone(),
            content_type: doc.mime_type.as_ref().map(|m| m.to_string()),
        });
    }

    out
}

/// Public link to the message when the chat has one, else a file reference.
fn attachment_url(msg: &Message, file: &FileMeta) -> String {
    msg.url()
        .map(|url| url.to_string())
        .unwrap_or_else(|| format!("tg://file?id={}", file.id))
}
