//! Telegram HTML snippets shared by the command handlers.

use teloxide::utils::html;

use super::message::UserRef;

/// Bold, escaped display name.
pub fn user_name(user: &UserRef) -> String {
    html::bold(&html::escape(&user.display_name))
}

/// Anchor with an escaped URL and plain-text label.
pub fn link(url: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        html::escape(url).replace('"', "&quot;"),
        html::escape(label)
    )
}

/// Clickable mention of a user id.
pub fn user_link(user_id: &str, label: &str) -> String {
    link(&format!("tg://user?id={}", user_id), label)
}

pub fn mention(user: &UserRef) -> String {
    user_link(&user.id, &user.display_name)
}

pub fn code(text: &str) -> String {
    format!("<code>{}</code>", html::escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_escaped() {
        let user = UserRef::new("5", "<Eve & co>");
        assert_eq!(user_name(&user), "<b>&lt;Eve &amp; co&gt;</b>");
        assert_eq!(
            mention(&user),
            "<a href=\"tg://user?id=5\">&lt;Eve &amp; co&gt;</a>"
        );
        assert_eq!(code(".delvouch <n>"), "<code>.delvouch &lt;n&gt;</code>");
    }

    #[test]
    fn test_quotes_cannot_end_href() {
        assert_eq!(
            link("https://cdn.example/a\"b.png?x=1&y=2", "View"),
            "<a href=\"https://cdn.example/a&quot;b.png?x=1&amp;y=2\">View</a>"
        );
    }
}
