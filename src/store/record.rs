//! A single vouch.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REASON: &str = "No reason provided";
pub const IMAGE_REASON: &str = "Image Vouch";
pub const ADMIN_IMAGE_REASON: &str = "Image Vouch (admin)";
pub const DEFAULT_ATTACHMENT_NAME: &str = "attachment";

/// Vouch record as persisted in the store file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VouchRecord {
    /// Id of the user who gave the vouch.
    pub by: String,
    pub reason: String,
    /// Human-readable creation time.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "addedByAdmin",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub added_by_admin: bool,
}

impl VouchRecord {
    /// Create a text vouch. A blank reason falls back to the placeholder.
    pub fn text(by: &str, reason: &str) -> Self {
        let reason = reason.trim();
        Self {
            by: by.to_string(),
            reason: if reason.is_empty() {
                DEFAULT_REASON.to_string()
            } else {
                reason.to_string()
            },
            date: format_date(&Local::now()),
            url: None,
            name: None,
            added_by_admin: false,
        }
    }

    /// Create an image-backed vouch.
    pub fn image(by: &str, url: &str, name: Option<&str>, added_by_admin: bool) -> Self {
        let reason = if added_by_admin {
            ADMIN_IMAGE_REASON
        } else {
            IMAGE_REASON
        };
        Self {
            by: by.to_string(),
            reason: reason.to_string(),
            date: format_date(&Local::now()),
            url: Some(url.to_string()),
            name: Some(
                name.filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_ATTACHMENT_NAME)
                    .to_string(),
            ),
            added_by_admin,
        }
    }
}

/// Format a timestamp like `10/19/2026, 3:04:05 PM`.
pub fn format_date(ts: &DateTime<Local>) -> String {
    ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
