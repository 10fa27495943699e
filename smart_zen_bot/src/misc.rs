use html_escape::encode_text;
use teloxide::types::User;

/// Tries to print the user in the prettiest way possible, with either
/// `@username` or full name, optionally with the user ID attached.
#[must_use]
pub fn user_name_prettyprint(user: &User, with_id: bool) -> String {
    let mut name = if let Some(username) = &user.username {
        format!("@{username}")
    } else {
        user.full_name()
    };

    if with_id {
        use std::fmt::Write;
        write!(name, " (userid {})", user.id).expect("Writing to a String never fails");
    }

    name
}

/// An HTML mention of the user, clickable even when they have no
/// username. For public notices in the group chat.
#[must_use]
pub fn user_mention_html(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{username}")
    } else {
        format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            user.id,
            encode_text(&user.full_name())
        )
    }
}
