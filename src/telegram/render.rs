//! Embed rendering as Telegram HTML.

use teloxide::utils::html;

use crate::core::format::link;
use crate::core::Embed;

/// Render an embed as a single HTML message.
pub fn render_embed(embed: &Embed) -> String {
    let mut out = html::bold(&embed.title);

    if let Some(description) = &embed.description {
        out.push_str("\n\n");
        out.push_str(description);
    }

    if !embed.fields.is_empty() {
        out.push('\n');
        for field in &embed.fields {
            out.push_str(&format!("\n{} {}", html::bold(&format!("{}:", field.name)), field.value));
        }
    }

    if let Some(url) = &embed.image_url {
        out.push_str("\n\n");
        out.push_str(&link(url, "🖼 View Image"));
    }

    let footer = match (&embed.footer, &embed.timestamp) {
        (Some(footer), Some(ts)) => Some(format!("{} • {}", footer, ts.format("%Y-%m-%d %H:%M"))),
        (Some(footer), None) => Some(footer.clone()),
        (None, Some(ts)) => Some(ts.format("%Y-%m-%d %H:%M").to_string()),
        (None, None) => None,
    };
    if let Some(footer) = footer {
        out.push_str("\n\n");
        out.push_str(&html::italic(&footer));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_render_full_embed() {
        let ts = Local.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        let embed = Embed::new("🗑 Vouch deleted")
            .field("Reason", "great trade")
            .field("Date", "10/19/2026, 9:00:00 AM")
            .image(Some("https://t.me/c/100/5".to_string()))
            .footer("proof.png")
            .timestamp(ts);

        assert_eq!(
            render_embed(&embed),
            "<b>🗑 Vouch deleted</b>\n\
             \n<b>Reason:</b> great trade\
             \n<b>Date:</b> 10/19/2026, 9:00:00 AM\
             \n\n<a href=\"https://t.me/c/100/5\">🖼 View Image</a>\
             \n\n<i>proof.png • 2026-10-19 09:30</i>"
        );
    }

    #[test]
    fn test_render_description_only() {
        let embed = Embed::new("📜 Vouches for Alice").description("<b>1.</b> x");
        assert_eq!(render_embed(&embed), "<b>📜 Vouches for Alice</b>\n\n<b>1.</b> x");
    }
}
