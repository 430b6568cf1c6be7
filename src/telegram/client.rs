//! Telegram bot client - simple polling version.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, MessageId, ParseMode, ReactionType, ReplyParameters};
use teloxide::RequestError;

use crate::config::Settings;
use crate::core::platform::{self, ChatPlatform, Embed, PlatformError};
use crate::core::{commands, IncomingMessage, Router};
use crate::error::Error;
use crate::store::VouchStore;

use super::convert::to_incoming;
use super::render::render_embed;

/// `ChatPlatform` backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat_id(channel_id: &str) -> platform::Result<ChatId> {
    channel_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| PlatformError::UnknownChannel(channel_id.to_string()))
}

fn message_id(msg: &IncomingMessage) -> platform::Result<MessageId> {
    msg.id
        .parse::<i32>()
        .map(MessageId)
        .map_err(|_| PlatformError::request(format!("bad message id '{}'", msg.id)))
}

fn request_error(e: RequestError) -> PlatformError {
    PlatformError::request(e.to_string())
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn reply(&self, msg: &IncomingMessage, text: &str) -> platform::Result<()> {
        self.bot
            .send_message(chat_id(&msg.channel_id)?, text)
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(message_id(msg)?))
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> platform::Result<()> {
        self.bot
            .send_message(chat_id(channel_id)?, render_embed(embed))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn react(&self, msg: &IncomingMessage, emoji: &str) -> platform::Result<()> {
        self.bot
            .set_message_reaction(chat_id(&msg.channel_id)?, message_id(msg)?)
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn can_manage_messages(&self, channel_id: &str, user_id: &str) -> platform::Result<bool> {
        let user_id = user_id
            .parse::<u64>()
            .map(UserId)
            .map_err(|_| PlatformError::request(format!("bad user id '{}'", user_id)))?;
        let member = self
            .bot
            .get_chat_member(chat_id(channel_id)?, user_id)
            .await
            .map_err(request_error)?;
        Ok(member.kind.can_delete_messages())
    }
}

/// Run the telegram bot daemon using long polling until interrupted.
pub async fn run_telegram_daemon(settings: Settings, token: String) -> Result<(), Error> {
    tracing::info!("Starting Telegram bot...");

    let store = VouchStore::load(settings.store_path()?)?;
    let bot = Bot::new(token);

    let me = bot
        .get_me()
        .await
        .map_err(|e| Error::Telegram(format!("Failed to authenticate: {}", e)))?;
    tracing::info!(
        "@{} is online, watching chat {}",
        me.username(),
        settings.vouch_channel_id
    );

    // Telegram's command menu only understands slash commands.
    if settings.prefix == "/" {
        let menu = commands::COMMANDS
            .iter()
            .map(|c| BotCommand::new(c.name, c.summary))
            .collect::<Vec<_>>();
        if let Err(e) = bot.set_my_commands(menu).await {
            tracing::warn!("Failed to set commands: {}", e);
        }
    }

    let router = Arc::new(Router::new(
        settings,
        store,
        TelegramPlatform::new(bot.clone()),
    ));

    teloxide::repl(bot, move |msg: Message| {
        let router = Arc::clone(&router);
        async move {
            if let Some(incoming) = to_incoming(&msg) {
                router.handle(&incoming).await;
            }
            respond(())
        }
    })
    .await;

    tracing::info!("Telegram bot stopped");
    Ok(())
}
