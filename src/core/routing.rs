//! Command detection and argument parsing.
//!
//! A command message looks like `<prefix><name> [args...]`, for example
//! `.delvouch <@42> 3`. Mention tokens are pulled out of the argument list;
//! the first mentioned user becomes the command target.

use regex::Regex;
use std::sync::OnceLock;

use super::message::{IncomingMessage, UserRef};

/// Parsed command invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandArgs {
    /// Lowercased command name without the prefix.
    pub name: String,
    /// First user mentioned in the message.
    pub target: Option<UserRef>,
    /// Remaining whitespace-separated tokens, mention tokens removed.
    pub rest: Vec<String>,
}

impl CommandArgs {
    /// Parse `msg` as a command, or `None` if it does not start with `prefix`.
    pub fn parse(prefix: &str, msg: &IncomingMessage) -> Option<Self> {
        let body = msg.content.trim_start().strip_prefix(prefix)?;
        let mut tokens = body.split_whitespace();
        let name = tokens.next()?.to_lowercase();

        let rest = tokens
            .filter(|t| !is_mention_token(t))
            .map(str::to_string)
            .collect();

        Some(Self {
            name,
            target: msg.mentions.first().cloned(),
            rest,
        })
    }

    /// Free text after the command, e.g. a vouch reason.
    pub fn text(&self) -> String {
        self.rest.join(" ")
    }

    /// First free argument as a 1-based index. Anything that is not a plain
    /// non-negative integer is rejected rather than read as zero.
    pub fn index(&self) -> Option<usize> {
        self.rest.first()?.parse().ok()
    }
}

fn mention_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<@!?\d+>$").ok()).as_ref()
}

/// Whether `token` is a normalized `<@id>` mention.
pub fn is_mention_token(token: &str) -> bool {
    mention_re().is_some_and(|re| re.is_match(token))
}

/// Build the normalized mention token for a user id.
pub fn mention_token(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str, mentions: Vec<UserRef>) -> IncomingMessage {
        IncomingMessage {
            id: "1".to_string(),
            channel_id: "-100".to_string(),
            author: UserRef::new("2", "Bob"),
            content: content.to_string(),
            attachments: Vec::new(),
            mentions,
            album_id: None,
        }
    }

    #[test]
    fn test_parse_command_with_mention_and_reason() {
        let alice = UserRef::new("42", "Alice");
        let msg = message(".Vouch <@42> great   trade", vec![alice.clone()]);

        let args = CommandArgs::parse(".", &msg).unwrap();
        assert_eq!(args.name, "vouch");
        assert_eq!(args.target, Some(alice));
        assert_eq!(args.rest, vec!["great", "trade"]);
        assert_eq!(args.text(), "great trade");
    }

    #[test]
    fn test_not_a_command() {
        assert!(CommandArgs::parse(".", &message("hello there", vec![])).is_none());
        assert!(CommandArgs::parse(".", &message(".", vec![])).is_none());
        assert!(CommandArgs::parse(".", &message(".   ", vec![])).is_none());
        assert!(CommandArgs::parse("!", &message(".vouches", vec![])).is_none());
    }

    #[test]
    fn test_index_parsing() {
        let alice = UserRef::new("42", "Alice");
        let parse = |content: &str| {
            CommandArgs::parse(".", &message(content, vec![alice.clone()]))
                .unwrap()
                .index()
        };

        assert_eq!(parse(".delvouch <@42> 3"), Some(3));
        assert_eq!(parse(".delvouch 3 <@42>"), Some(3));
        assert_eq!(parse(".delvouch <@42> 0"), Some(0));
        assert_eq!(parse(".delvouch <@42> -1"), None);
        assert_eq!(parse(".delvouch <@42> two"), None);
        assert_eq!(parse(".delvouch <@42> 2x"), None);
        assert_eq!(parse(".delvouch <@42>"), None);
    }

    #[test]
    fn test_mention_tokens() {
        assert!(is_mention_token("<@123>"));
        assert!(is_mention_token("<@!123>"));
        assert!(!is_mention_token("@alice"));
        assert!(!is_mention_token("<@abc>"));
        assert_eq!(mention_token("7"), "<@7>");
    }
}
