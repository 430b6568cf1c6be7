//! Telegram bot integration.

pub mod client;
pub mod convert;
pub mod render;

pub use client::{run_telegram_daemon, TelegramPlatform};
