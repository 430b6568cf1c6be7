//! Core module - message model, command routing and the platform seam.
//!
//! Nothing in here talks to Telegram directly:
//! - `message`: platform-neutral inbound messages
//! - `routing`: prefix detection and argument parsing
//! - `platform`: the outbound operations the router needs
//! - `commands`: the command table and its handlers
//! - `router`: per-message classification and dispatch

pub mod commands;
pub mod format;
pub mod message;
pub mod platform;
pub mod router;
pub mod routing;

pub use message::{Attachment, IncomingMessage, UserRef};
pub use platform::{ChatPlatform, Embed, EmbedField, PlatformError};
pub use router::Router;
