//! Configuration loading for VouchBot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variables checked, in order, for the bot token.
pub const TOKEN_ENV_VARS: [&str; 2] = ["VOUCHBOT_TOKEN", "TELOXIDE_TOKEN"];

/// Get the VouchBot home directory (~/.vouchbot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".vouchbot"))
}

/// Get the default settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from an explicit path, or ~/.vouchbot/settings.json.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_settings_path()?,
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}. Run 'vouchbot init' first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.prefix.is_empty() {
        return Err(Error::Config("prefix must not be empty".to_string()));
    }
    if settings.prefix.chars().any(char::is_whitespace) {
        return Err(Error::Config(format!(
            "prefix '{}' must not contain whitespace",
            settings.prefix
        )));
    }
    if settings.vouch_channel_id.trim().is_empty() {
        return Err(Error::Config("vouch_channel_id is required".to_string()));
    }
    Ok(())
}

/// Write a settings template, refusing to clobber an existing file unless forced.
pub fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let template = Settings {
        vouch_channel_id: "-1001234567890".to_string(),
        ..Settings::default()
    };
    std::fs::write(path, serde_json::to_string_pretty(&template)?)?;
    tracing::info!("Wrote settings template to {}", path.display());
    Ok(())
}

/// Resolve the bot token: an explicit value wins, then the environment.
pub fn resolve_token(explicit: Option<&str>) -> Result<String> {
    let raw = match explicit {
        Some(t) => Some(t.to_string()),
        None => TOKEN_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok()),
    };

    match raw.map(|t| t.trim().to_string()) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(Error::Config(format!(
            "No bot token configured. Set {}.",
            TOKEN_ENV_VARS[0]
        ))),
    }
}

/// Optional cosmetic replies tied to specific users.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Flavor {
    /// Auto-vouches from this user get `special_reply` as a reply.
    pub special_user_id: Option<String>,
    #[serde(default = "default_special_reply")]
    pub special_reply: String,
    /// Listing this user's vouches appends `roast_line`.
    pub roast_target_id: Option<String>,
    #[serde(default = "default_roast_line")]
    pub roast_line: String,
}

fn default_special_reply() -> String {
    "Yes honey 💖".to_string()
}

fn default_roast_line() -> String {
    "💔🥀 you're so chopped twin".to_string()
}

impl Default for Flavor {
    fn default() -> Self {
        Self {
            special_user_id: None,
            special_reply: default_special_reply(),
            roast_target_id: None,
            roast_line: default_roast_line(),
        }
    }
}

/// VouchBot settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Chat where vouches are posted and images are auto-vouched.
    #[serde(default)]
    pub vouch_channel_id: String,

    /// Chat that receives deletion audit messages.
    #[serde(default)]
    pub log_channel_id: Option<String>,

    #[serde(default)]
    pub admin_ids: Vec<String>,

    /// Defaults to ~/.vouchbot/vouches.json.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default = "default_reaction")]
    pub reaction: String,

    #[serde(default)]
    pub flavor: Flavor,
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_reaction() -> String {
    "👍".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            vouch_channel_id: String::new(),
            log_channel_id: None,
            admin_ids: Vec::new(),
            store_path: None,
            reaction: default_reaction(),
            flavor: Flavor::default(),
        }
    }
}

impl Settings {
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }

    /// Resolve where the vouch store lives.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(p) => Ok(p.clone()),
            None => Ok(get_home_dir()?.join("vouches.json")),
        }
    }
}
