//! Per-message routing.
//!
//! An image post in the vouch channel becomes an auto-vouch for its author.
//! A prefixed message naming a known command then goes to its handler, so a
//! command posted with a screenshot records both. `forcevouch` is the
//! exception: its images belong to the target, and so do the remaining
//! photos of its album, which Telegram delivers as separate messages.

use std::collections::VecDeque;

use teloxide::utils::html;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::store::{VouchRecord, VouchStore};

use super::commands::{self, Access, Action, CommandContext, CommandSpec};
use super::message::IncomingMessage;
use super::platform::ChatPlatform;
use super::routing::CommandArgs;

const NO_PERMISSION: &str = "🚫 You don’t have permission.";
const WRONG_CHANNEL: &str = "❌ Vouches can only be posted in the vouch channel.";

/// How many recent `forcevouch` albums are remembered.
const ALBUM_MEMORY: usize = 32;

/// Album started by a `forcevouch`: later photos go to the same target.
#[derive(Clone, Debug)]
struct ForcedAlbum {
    album_id: String,
    target_id: String,
}

/// Owns the vouch store and routes messages to it.
pub struct Router<P> {
    settings: Settings,
    store: Mutex<VouchStore>,
    platform: P,
    forced_albums: Mutex<VecDeque<ForcedAlbum>>,
}

impl<P: ChatPlatform> Router<P> {
    pub fn new(settings: Settings, store: VouchStore, platform: P) -> Self {
        Self {
            settings,
            store: Mutex::new(store),
            platform,
            forced_albums: Mutex::new(VecDeque::new()),
        }
    }

    /// Handle one inbound message to completion. Never fails: every problem
    /// ends up as a reply to the user or a log line.
    pub async fn handle(&self, msg: &IncomingMessage) {
        if msg.author.is_bot {
            return;
        }

        let command = CommandArgs::parse(&self.settings.prefix, msg).and_then(|args| {
            let spec = commands::find(&args.name);
            if spec.is_none() {
                tracing::debug!("Ignoring unknown command '{}'", args.name);
            }
            spec.map(|spec| (spec, args))
        });
        let is_forcevouch = matches!(&command, Some((spec, _)) if spec.name == "forcevouch");

        if msg.channel_id == self.settings.vouch_channel_id && !is_forcevouch {
            match self.forced_album_target(msg).await {
                Some(target_id) => self.continue_forced_album(msg, &target_id).await,
                None => self.auto_vouch(msg).await,
            }
        }

        if let Some((spec, args)) = command {
            self.dispatch(msg, spec, args).await;
        }
    }

    async fn forced_album_target(&self, msg: &IncomingMessage) -> Option<String> {
        let album_id = msg.album_id.as_deref()?;
        self.forced_albums
            .lock()
            .await
            .iter()
            .find(|a| a.album_id == album_id)
            .map(|a| a.target_id.clone())
    }

    async fn remember_forced_album(&self, msg: &IncomingMessage, args: &CommandArgs) {
        let (Some(album_id), Some(target)) = (&msg.album_id, &args.target) else {
            return;
        };
        let mut albums = self.forced_albums.lock().await;
        if albums.len() == ALBUM_MEMORY {
            albums.pop_front();
        }
        albums.push_back(ForcedAlbum {
            album_id: album_id.clone(),
            target_id: target.id.clone(),
        });
    }

    /// Record the images of a later album message as admin vouches for the
    /// album's `forcevouch` target.
    async fn continue_forced_album(&self, msg: &IncomingMessage, target_id: &str) {
        let records: Vec<VouchRecord> = msg
            .images()
            .iter()
            .map(|att| VouchRecord::image(&msg.author.id, &att.url, att.name.as_deref(), true))
            .collect();
        if records.is_empty() {
            return;
        }

        let saved = {
            let mut store = self.store.lock().await;
            store.append_all(target_id, records)
        };
        let actions = match saved {
            Ok(added) => {
                tracing::info!(
                    "Added {} album image(s) from {} to {}",
                    added,
                    msg.author.id,
                    target_id
                );
                vec![Action::React]
            }
            Err(e) => {
                tracing::error!("Failed to add album images for {}: {}", target_id, e);
                vec![Action::Reply(commands::SAVE_FAILED.to_string())]
            }
        };
        self.perform(msg, actions).await;
    }

    async fn dispatch(&self, msg: &IncomingMessage, spec: &'static CommandSpec, args: CommandArgs) {
        tracing::debug!(
            "Command '{}' from {} in {}",
            spec.name,
            msg.author.id,
            msg.channel_id
        );

        if let Some(rejection) = self.check_access(spec.access, msg).await {
            tracing::info!(
                "Rejected '{}' from {}: {}",
                spec.name,
                msg.author.id,
                rejection
            );
            self.perform(msg, vec![Action::Reply(rejection.to_string())])
                .await;
            return;
        }

        if spec.name == "forcevouch" {
            self.remember_forced_album(msg, &args).await;
        }

        let actions = {
            let mut store = self.store.lock().await;
            let mut ctx = CommandContext {
                settings: &self.settings,
                store: &mut *store,
                message: msg,
                args: &args,
            };
            (spec.handler)(&mut ctx)
        };
        self.perform(msg, actions).await;
    }

    /// Returns the rejection reply when `msg.author` may not run the command.
    async fn check_access(&self, access: Access, msg: &IncomingMessage) -> Option<&'static str> {
        let allowed = match access {
            Access::Anyone => true,
            Access::VouchChannel => {
                if msg.channel_id != self.settings.vouch_channel_id {
                    return Some(WRONG_CHANNEL);
                }
                true
            }
            Access::Admin => self.settings.is_admin(&msg.author.id),
            Access::Moderator => {
                self.settings.is_admin(&msg.author.id)
                    || match self
                        .platform
                        .can_manage_messages(&msg.channel_id, &msg.author.id)
                        .await
                    {
                        Ok(allowed) => allowed,
                        Err(e) => {
                            tracing::warn!(
                                "Failed to check permissions of {}: {}",
                                msg.author.id,
                                e
                            );
                            false
                        }
                    }
            }
        };
        (!allowed).then_some(NO_PERMISSION)
    }

    /// Record every image in `msg` as a vouch for its author.
    async fn auto_vouch(&self, msg: &IncomingMessage) {
        let images = msg.images();
        if images.is_empty() {
            return;
        }

        let records: Vec<VouchRecord> = images
            .iter()
            .map(|att| VouchRecord::image(&msg.author.id, &att.url, att.name.as_deref(), false))
            .collect();

        let saved = {
            let mut store = self.store.lock().await;
            store.append_all(&msg.author.id, records)
        };

        let mut actions = Vec::new();
        match saved {
            Ok(added) => {
                tracing::info!("Auto-vouched {} image(s) for {}", added, msg.author.id);
                actions.push(Action::React);
                let flavor = &self.settings.flavor;
                if flavor.special_user_id.as_deref() == Some(msg.author.id.as_str()) {
                    actions.push(Action::Reply(html::escape(&flavor.special_reply)));
                }
            }
            Err(e) => {
                tracing::error!("Failed to auto-vouch for {}: {}", msg.author.id, e);
                actions.push(Action::Reply(
                    "⚠️ Could not record your image vouch. Try again later.".to_string(),
                ));
            }
        }
        self.perform(msg, actions).await;
    }

    /// Carry out handler actions. Failures are logged and never retried.
    async fn perform(&self, msg: &IncomingMessage, actions: Vec<Action>) {
        for action in actions {
            let (what, result) = match &action {
                Action::Reply(text) => ("reply", self.platform.reply(msg, text).await),
                Action::Send(embed) => (
                    "send",
                    self.platform.send_embed(&msg.channel_id, embed).await,
                ),
                Action::React => (
                    "react",
                    self.platform.react(msg, &self.settings.reaction).await,
                ),
                Action::Log(embed) => match &self.settings.log_channel_id {
                    Some(channel_id) => ("log", self.platform.send_embed(channel_id, embed).await),
                    None => {
                        tracing::debug!("No log channel configured, skipping audit message");
                        continue;
                    }
                },
            };
            if let Err(e) = result {
                tracing::warn!("Failed to {} for message {}: {}", what, msg.id, e);
            }
        }
    }
}
