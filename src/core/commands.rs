//! Vouch commands.
//!
//! Every command is a row in [`COMMANDS`]: its name, who may run it, and a
//! synchronous handler. Handlers mutate the store and describe what should be
//! sent back as a list of [`Action`]s; the router performs those afterwards.

use chrono::Local;
use teloxide::utils::html;

use crate::config::Settings;
use crate::store::{StoreError, VouchRecord, VouchStore};

use super::format::{code, link, mention, user_link, user_name};
use super::message::IncomingMessage;
use super::platform::Embed;
use super::routing::CommandArgs;

/// Who may run a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Anyone,
    /// Only inside the vouch channel.
    VouchChannel,
    /// Only users on the admin allow-list.
    Admin,
    /// Users allowed to delete messages in the chat, or admins.
    Moderator,
}

/// Outbound effect of a handler.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Reply to the triggering message.
    Reply(String),
    /// Post a rich message in the triggering channel.
    Send(Embed),
    /// React to the triggering message with the configured emoji.
    React,
    /// Post a rich message to the audit log channel, if one is configured.
    Log(Embed),
}

pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    pub store: &'a mut VouchStore,
    pub message: &'a IncomingMessage,
    pub args: &'a CommandArgs,
}

pub type Handler = fn(&mut CommandContext<'_>) -> Vec<Action>;

pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub access: Access,
    pub handler: Handler,
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "vouch",
        usage: "vouch @user [reason]",
        summary: "Vouch for a user",
        access: Access::VouchChannel,
        handler: cmd_vouch,
    },
    CommandSpec {
        name: "forcevouch",
        usage: "forcevouch @user",
        summary: "Add attached images as vouches for a user (admin)",
        access: Access::Admin,
        handler: cmd_forcevouch,
    },
    CommandSpec {
        name: "delvouch",
        usage: "delvouch @user <number>",
        summary: "Delete one vouch",
        access: Access::Moderator,
        handler: cmd_delvouch,
    },
    CommandSpec {
        name: "clearvouch",
        usage: "clearvouch @user",
        summary: "Delete all vouches of a user",
        access: Access::Moderator,
        handler: cmd_clearvouch,
    },
    CommandSpec {
        name: "listvouches",
        usage: "listvouches @user",
        summary: "List a user's vouches",
        access: Access::Anyone,
        handler: cmd_listvouches,
    },
    CommandSpec {
        name: "vouches",
        usage: "vouches @user",
        summary: "Count a user's vouches",
        access: Access::Anyone,
        handler: cmd_vouches,
    },
    CommandSpec {
        name: "help",
        usage: "help",
        summary: "Show this help",
        access: Access::Anyone,
        handler: cmd_help,
    },
];

/// Look up a command by its lowercased name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

pub(super) const SAVE_FAILED: &str = "⚠️ Could not save vouches right now. Try again later.";
const MENTION_A_USER: &str = "❌ Mention a user.";

fn reply(text: impl Into<String>) -> Vec<Action> {
    vec![Action::Reply(text.into())]
}

fn usage(ctx: &CommandContext<'_>, usage: &str) -> Vec<Action> {
    reply(format!(
        "❌ Usage: {}",
        code(&format!("{}{}", ctx.settings.prefix, usage))
    ))
}

fn cmd_vouch(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let Some(target) = ctx.args.target.as_ref() else {
        return reply("❌ Mention the user you want to vouch for.");
    };

    let record = VouchRecord::text(&ctx.message.author.id, &ctx.args.text());
    match ctx.store.append(&target.id, record) {
        Ok(()) => {
            tracing::info!(
                "{} vouched for {} ({})",
                ctx.message.author.id,
                target.id,
                ctx.store.count_of(&target.id)
            );
            reply(format!("✅ Vouch added for {}.", user_name(target)))
        }
        Err(e) => {
            tracing::error!("Failed to add vouch for {}: {}", target.id, e);
            reply(SAVE_FAILED)
        }
    }
}

fn cmd_forcevouch(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let Some(target) = ctx.args.target.as_ref() else {
        return reply("❌ Mention a valid user.");
    };
    if ctx.message.attachments.is_empty() {
        return reply("❌ Attach at least one image.");
    }
    let images = ctx.message.images();
    if images.is_empty() {
        return reply("❌ No valid images attached.");
    }

    let records = images
        .iter()
        .map(|att| VouchRecord::image(&ctx.message.author.id, &att.url, att.name.as_deref(), true))
        .collect();
    match ctx.store.append_all(&target.id, records) {
        Ok(added) => {
            tracing::info!(
                "Admin {} force-added {} image vouches for {}",
                ctx.message.author.id,
                added,
                target.id
            );
            vec![
                Action::React,
                Action::Reply(format!(
                    "✅ Added {} image vouch(es) for {} on their behalf.",
                    added,
                    user_name(target)
                )),
            ]
        }
        Err(e) => {
            tracing::error!("Failed to force-add vouches for {}: {}", target.id, e);
            reply(SAVE_FAILED)
        }
    }
}

fn cmd_delvouch(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let (Some(target), Some(index)) = (ctx.args.target.as_ref(), ctx.args.index()) else {
        return usage(ctx, "delvouch @user <vouchNumber>");
    };

    let removed = match ctx.store.remove_at(&target.id, index) {
        Ok(removed) => removed,
        Err(StoreError::InvalidIndex { .. }) => return reply("❌ Invalid vouch index."),
        Err(e) => {
            tracing::error!("Failed to delete vouch #{} for {}: {}", index, target.id, e);
            return reply(SAVE_FAILED);
        }
    };
    tracing::info!(
        "{} deleted vouch #{} for {}",
        ctx.message.author.id,
        index,
        target.id
    );

    let audit = Embed::new(format!(
        "🗑 Vouch deleted by {}",
        mention(&ctx.message.author)
    ))
    .field("Vouched User", mention(target))
    .field("Reason", html::escape(&removed.reason))
    .field("Date", html::escape(&removed.date))
    .image(removed.url.clone())
    .footer(html::escape(
        removed.name.as_deref().unwrap_or(crate::store::record::DEFAULT_ATTACHMENT_NAME),
    ))
    .timestamp(Local::now());

    vec![
        Action::Log(audit),
        Action::Reply(format!(
            "🗑 Deleted vouch #{} for {}.",
            index,
            user_name(target)
        )),
    ]
}

fn cmd_clearvouch(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let Some(target) = ctx.args.target.as_ref() else {
        return reply(MENTION_A_USER);
    };

    match ctx.store.clear(&target.id) {
        Ok(removed) => {
            tracing::info!(
                "{} cleared {} vouches for {}",
                ctx.message.author.id,
                removed,
                target.id
            );
            reply(format!(
                "🧹 Cleared {} vouch(es) for {}.",
                removed,
                user_name(target)
            ))
        }
        Err(e) => {
            tracing::error!("Failed to clear vouches for {}: {}", target.id, e);
            reply(SAVE_FAILED)
        }
    }
}

fn cmd_listvouches(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let Some(target) = ctx.args.target.as_ref() else {
        return reply(MENTION_A_USER);
    };

    let vouches = ctx.store.list_of(&target.id);
    if vouches.is_empty() {
        return reply(format!("❌ {} has no vouches.", user_name(target)));
    }

    let mut description = vouches
        .iter()
        .enumerate()
        .map(|(i, v)| render_vouch(i + 1, v))
        .collect::<Vec<_>>()
        .join("\n\n");

    let flavor = &ctx.settings.flavor;
    if flavor.roast_target_id.as_deref() == Some(target.id.as_str()) {
        description.push_str("\n\n");
        description.push_str(&html::escape(&flavor.roast_line));
    }

    let embed = Embed::new(format!(
        "📜 Vouches for {}",
        html::escape(&target.display_name)
    ))
    .description(description)
    .timestamp(Local::now());
    vec![Action::Send(embed)]
}

fn render_vouch(number: usize, v: &VouchRecord) -> String {
    let mut line = format!(
        "<b>{}.</b> {} → {}",
        number,
        user_link(&v.by, &v.by),
        html::italic(&html::escape(&v.reason))
    );
    if let Some(url) = &v.url {
        line.push(' ');
        line.push_str(&link(url, "View Image"));
    }
    line.push_str(&format!("\n🕒 {}", html::escape(&v.date)));
    if v.added_by_admin {
        line.push_str(" (added by admin)");
    }
    line
}

fn cmd_vouches(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let Some(target) = ctx.args.target.as_ref() else {
        return reply(MENTION_A_USER);
    };

    let count = ctx.store.count_of(&target.id);
    reply(format!(
        "✅ {} has <b>{}</b> vouches.",
        user_name(target),
        count
    ))
}

fn cmd_help(ctx: &mut CommandContext<'_>) -> Vec<Action> {
    let mut text = String::from("<b>Vouch commands</b>\n");
    for spec in COMMANDS {
        text.push_str(&format!(
            "\n{} - {}",
            code(&format!("{}{}", ctx.settings.prefix, spec.usage)),
            html::escape(spec.summary)
        ));
    }
    text.push_str("\n\nImages posted in the vouch channel are recorded automatically.");
    reply(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Attachment, UserRef};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        settings: Settings,
        store: VouchStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = VouchStore::load(dir.path().join("vouches.json")).unwrap();
        let mut settings = Settings {
            vouch_channel_id: "-100".to_string(),
            admin_ids: vec!["1".to_string()],
            ..Settings::default()
        };
        settings.flavor.roast_target_id = Some("66".to_string());
        Fixture {
            _dir: dir,
            settings,
            store,
        }
    }

    fn message(author: &str, content: &str, mentions: Vec<UserRef>) -> IncomingMessage {
        IncomingMessage {
            id: "10".to_string(),
            channel_id: "-100".to_string(),
            author: UserRef::new(author, "Author"),
            content: content.to_string(),
            attachments: Vec::new(),
            mentions,
            album_id: None,
        }
    }

    fn run(fx: &mut Fixture, msg: &IncomingMessage) -> Vec<Action> {
        let args = CommandArgs::parse(&fx.settings.prefix, msg).unwrap();
        let spec = find(&args.name).unwrap();
        let mut ctx = CommandContext {
            settings: &fx.settings,
            store: &mut fx.store,
            message: msg,
            args: &args,
        };
        (spec.handler)(&mut ctx)
    }

    fn reply_text(actions: &[Action]) -> &str {
        actions
            .iter()
            .find_map(|a| match a {
                Action::Reply(text) => Some(text.as_str()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_table_names_are_unique_and_lowercase() {
        for (i, spec) in COMMANDS.iter().enumerate() {
            assert_eq!(spec.name, spec.name.to_lowercase());
            assert!(spec.usage.starts_with(spec.name));
            assert!(COMMANDS[i + 1..].iter().all(|other| other.name != spec.name));
        }
        assert!(find("vouch").is_some());
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_vouch_without_reason_uses_placeholder() {
        let mut fx = fixture();
        let alice = UserRef::new("42", "Alice");
        run(&mut fx, &message("2", ".vouch <@42>", vec![alice]));

        let list = fx.store.list_of("42");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].reason, crate::store::record::DEFAULT_REASON);
        assert_eq!(list[0].by, "2");
    }

    #[test]
    fn test_vouch_requires_mention() {
        let mut fx = fixture();
        let actions = run(&mut fx, &message("2", ".vouch great trade", vec![]));
        assert!(reply_text(&actions).contains("Mention"));
        assert_eq!(fx.store.total(), 0);
    }

    #[test]
    fn test_forcevouch_adds_one_admin_record_per_image() {
        let mut fx = fixture();
        let mut msg = message("1", ".forcevouch <@42>", vec![UserRef::new("42", "Alice")]);
        msg.attachments = vec![
            Attachment {
                url: "https://t.me/c/100/10".to_string(),
                name: Some("a.png".to_string()),
                content_type: None,
            },
            Attachment {
                url: "https://t.me/c/100/10".to_string(),
                name: Some("notes.txt".to_string()),
                content_type: Some("text/plain".to_string()),
            },
        ];

        let actions = run(&mut fx, &msg);
        assert_eq!(actions[0], Action::React);
        assert!(reply_text(&actions).contains("Added 1 image vouch(es)"));

        let list = fx.store.list_of("42");
        assert_eq!(list.len(), 1);
        assert!(list[0].added_by_admin);
        assert_eq!(list[0].by, "1");
        assert_eq!(list[0].name.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_forcevouch_rejects_missing_or_non_image_attachments() {
        let mut fx = fixture();
        let alice = UserRef::new("42", "Alice");

        let msg = message("1", ".forcevouch <@42>", vec![alice.clone()]);
        assert!(reply_text(&run(&mut fx, &msg)).contains("Attach at least one image"));

        let mut msg = message("1", ".forcevouch <@42>", vec![alice]);
        msg.attachments.push(Attachment {
            url: "tg://file?id=x".to_string(),
            name: Some("doc.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
        });
        assert!(reply_text(&run(&mut fx, &msg)).contains("No valid images"));
        assert_eq!(fx.store.total(), 0);
    }

    #[test]
    fn test_delvouch_logs_removed_record() {
        let mut fx = fixture();
        fx.store
            .append("42", VouchRecord::image("7", "https://t.me/c/100/3", Some("p.png"), false))
            .unwrap();
        fx.store.append("42", VouchRecord::text("8", "second")).unwrap();

        let actions = run(
            &mut fx,
            &message("1", ".delvouch <@42> 1", vec![UserRef::new("42", "Alice")]),
        );
        assert_eq!(reply_text(&actions), "🗑 Deleted vouch #1 for <b>Alice</b>.");

        let Some(Action::Log(audit)) = actions.first() else {
            panic!("expected audit log action, got {:?}", actions);
        };
        assert!(audit.title.starts_with("🗑 Vouch deleted by"));
        assert_eq!(audit.image_url.as_deref(), Some("https://t.me/c/100/3"));
        assert_eq!(audit.footer.as_deref(), Some("p.png"));
        assert_eq!(audit.fields[1].value, "Image Vouch");

        assert_eq!(fx.store.list_of("42")[0].reason, "second");
    }

    #[test]
    fn test_delvouch_bad_arguments() {
        let mut fx = fixture();
        fx.store.append("42", VouchRecord::text("8", "only")).unwrap();
        let alice = UserRef::new("42", "Alice");

        let actions = run(&mut fx, &message("1", ".delvouch <@42> abc", vec![alice.clone()]));
        assert!(reply_text(&actions).starts_with("❌ Usage:"));

        let actions = run(&mut fx, &message("1", ".delvouch 1", vec![]));
        assert!(reply_text(&actions).starts_with("❌ Usage:"));

        for index in ["0", "2"] {
            let content = format!(".delvouch <@42> {}", index);
            let actions = run(&mut fx, &message("1", &content, vec![alice.clone()]));
            assert_eq!(reply_text(&actions), "❌ Invalid vouch index.");
        }
        assert_eq!(fx.store.count_of("42"), 1);
    }

    #[test]
    fn test_clearvouch_reports_removed_count() {
        let mut fx = fixture();
        fx.store.append("42", VouchRecord::text("8", "a")).unwrap();
        fx.store.append("42", VouchRecord::text("9", "b")).unwrap();

        let actions = run(
            &mut fx,
            &message("1", ".clearvouch <@42>", vec![UserRef::new("42", "Alice")]),
        );
        assert_eq!(reply_text(&actions), "🧹 Cleared 2 vouch(es) for <b>Alice</b>.");
        assert_eq!(fx.store.count_of("42"), 0);
    }

    #[test]
    fn test_listvouches_renders_each_record() {
        let mut fx = fixture();
        fx.store.append("42", VouchRecord::text("8", "fast <payment>")).unwrap();
        fx.store
            .append("42", VouchRecord::image("1", "https://t.me/c/100/3", None, true))
            .unwrap();

        let actions = run(
            &mut fx,
            &message("2", ".listvouches <@42>", vec![UserRef::new("42", "Alice")]),
        );
        let [Action::Send(embed)] = actions.as_slice() else {
            panic!("expected a single embed, got {:?}", actions);
        };
        assert_eq!(embed.title, "📜 Vouches for Alice");

        let description = embed.description.as_deref().unwrap();
        assert!(description.starts_with("<b>1.</b> <a href=\"tg://user?id=8\">8</a> → <i>fast &lt;payment&gt;</i>"));
        assert!(description.contains("<b>2.</b>"));
        assert!(description.contains("<a href=\"https://t.me/c/100/3\">View Image</a>"));
        assert!(description.contains("(added by admin)"));
        assert!(!description.contains("chopped"));
    }

    #[test]
    fn test_listvouches_empty_and_roast() {
        let mut fx = fixture();
        let actions = run(
            &mut fx,
            &message("2", ".listvouches <@42>", vec![UserRef::new("42", "Alice")]),
        );
        assert_eq!(reply_text(&actions), "❌ <b>Alice</b> has no vouches.");

        fx.store.append("66", VouchRecord::text("8", "ok")).unwrap();
        let actions = run(
            &mut fx,
            &message("2", ".listvouches <@66>", vec![UserRef::new("66", "Helper")]),
        );
        let [Action::Send(embed)] = actions.as_slice() else {
            panic!("expected a single embed, got {:?}", actions);
        };
        assert!(embed
            .description
            .as_deref()
            .unwrap()
            .ends_with("you're so chopped twin"));
    }

    #[test]
    fn test_vouches_count_for_unknown_user_is_zero() {
        let mut fx = fixture();
        let actions = run(
            &mut fx,
            &message("2", ".vouches <@42>", vec![UserRef::new("42", "Alice")]),
        );
        assert_eq!(reply_text(&actions), "✅ <b>Alice</b> has <b>0</b> vouches.");
    }

    #[test]
    fn test_help_lists_every_command_with_prefix() {
        let mut fx = fixture();
        fx.settings.prefix = "!".to_string();
        let actions = run(&mut fx, &message("2", "!help", vec![]));
        let text = reply_text(&actions);
        for spec in COMMANDS {
            assert!(text.contains(&format!("<code>!{}", spec.name)));
        }
    }
}
