//! CLI commands for VouchBot using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{self, load_settings, Settings};
use crate::store::VouchStore;

/// VouchBot - records and lists vouches for community members on Telegram.
#[derive(Parser)]
#[command(name = "vouchbot")]
#[command(version)]
#[command(about = "VouchBot - vouch tracking for Telegram groups", long_about = None)]
pub struct Commands {
    /// Settings file (default: ~/.vouchbot/settings.json)
    #[arg(long, global = true, env = "VOUCHBOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the bot and process messages until interrupted
    Run {
        /// Bot token (falls back to $TELOXIDE_TOKEN)
        #[arg(long, env = "VOUCHBOT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Write a settings template
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Print a user's vouches
    List {
        /// Telegram user id
        user_id: String,
    },

    /// Print vouch counts per user
    Stats,

    /// Validate settings and the vouch store
    Check,
}

impl Commands {
    pub async fn run(&self) -> Result<()> {
        let config = self.config.as_deref();
        match &self.command {
            Command::Run { token } => cmd_run(config, token.as_deref()).await,
            Command::Init { force } => cmd_init(config, *force),
            Command::List { user_id } => cmd_list(config, user_id),
            Command::Stats => cmd_stats(config),
            Command::Check => cmd_check(config),
        }
    }
}

fn open_store(settings: &Settings) -> Result<VouchStore> {
    Ok(VouchStore::load(settings.store_path()?)?)
}

async fn cmd_run(config: Option<&Path>, token: Option<&str>) -> Result<()> {
    let settings = load_settings(config)?;
    let token = config::resolve_token(token)?;
    crate::telegram::run_telegram_daemon(settings, token).await?;
    Ok(())
}

fn cmd_init(config: Option<&Path>, force: bool) -> Result<()> {
    let path = match config {
        Some(p) => p.to_path_buf(),
        None => config::get_settings_path()?,
    };
    config::write_template(&path, force)?;
    println!("Wrote settings template to {}", path.display());
    println!("Set vouch_channel_id and admin_ids, then export VOUCHBOT_TOKEN and run 'vouchbot run'.");
    Ok(())
}

fn cmd_list(config: Option<&Path>, user_id: &str) -> Result<()> {
    let settings = load_settings(config)?;
    let store = open_store(&settings)?;

    let vouches = store.list_of(user_id);
    if vouches.is_empty() {
        println!("{} has no vouches.", user_id);
        return Ok(());
    }

    println!("Vouches for {} ({}):", user_id, vouches.len());
    for (i, v) in vouches.iter().enumerate() {
        let admin = if v.added_by_admin { " (added by admin)" } else { "" };
        println!("  {}. by {} - {} [{}]{}", i + 1, v.by, v.reason, v.date, admin);
        if let Some(url) = &v.url {
            println!("     {}", url);
        }
    }
    Ok(())
}

fn cmd_stats(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let store = open_store(&settings)?;

    let mut users = store.users();
    users.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (user_id, count) in &users {
        println!("  {:>20}  {}", user_id, count);
    }
    println!("{} users, {} vouches", users.len(), store.total());
    Ok(())
}

fn cmd_check(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    println!("Settings OK");
    println!("  prefix:        {}", settings.prefix);
    println!("  vouch channel: {}", settings.vouch_channel_id);
    println!(
        "  log channel:   {}",
        settings.log_channel_id.as_deref().unwrap_or("(none)")
    );
    println!("  admins:        {}", settings.admin_ids.len());

    let store = open_store(&settings)?;
    println!(
        "Store OK: {} ({} vouches)",
        store.path().display(),
        store.total()
    );

    match config::resolve_token(None) {
        Ok(_) => println!("Token: found in environment"),
        Err(e) => println!("Token: {}", e),
    }
    Ok(())
}
