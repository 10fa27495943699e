//! Functions that perform stuff via the bot. Every call here is guarded
//! on its own: a failure is logged and reported back as a bool where the
//! caller cares, and never tears down the rest of a moderation pass.

use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    sugar::request::RequestLinkPreviewExt,
    types::{ChatId, Message, ParseMode, User},
    ApiError, Bot, RequestError,
};
use zen_bot_commons::teloxide_retry;

use crate::{misc::user_mention_html, types::Verdict};

/// Delete the message, best-effort. Deletion can legitimately fail, for
/// example when the bot lacks admin rights, so the result is advisory.
pub async fn delete_message_best_effort(bot: &Bot, message: &Message) -> bool {
    match teloxide_retry!(bot.delete_message(message.chat.id, message.id).await) {
        Ok(_) => true,
        Err(RequestError::Api(ApiError::MessageIdInvalid | ApiError::MessageToDeleteNotFound)) => {
            // Someone else probably has already deleted it. That's fine.
            true
        }
        Err(e) => {
            log::warn!(
                "Failed to delete message {} in {}: {}",
                message.id,
                message.chat.id,
                e
            );
            false
        }
    }
}

/// Kick is a ban followed by an immediate unban, so the user can rejoin
/// after thinking about what they did. A refused ban usually means the
/// target is an admin, which is an expected outcome and not an error.
pub async fn kick_user(bot: &Bot, chat_id: ChatId, user: &User) -> bool {
    if let Err(e) = teloxide_retry!(bot.ban_chat_member(chat_id, user.id).await) {
        match e {
            RequestError::Api(api_error) => {
                log::info!(
                    "Could not kick user {} from {} (likely an admin): {}",
                    user.id,
                    chat_id,
                    api_error
                );
            }
            other => {
                log::warn!("Failed to kick user {} from {}: {}", user.id, chat_id, other);
            }
        }
        return false;
    }

    if let Err(e) = teloxide_retry!(bot.unban_chat_member(chat_id, user.id).await) {
        // They stay banned instead of kicked. Not what we wanted, but
        // not worth aborting over.
        log::warn!("Failed to unban user {} in {}: {}", user.id, chat_id, e);
    }

    true
}

/// Send an HTML notice to the chat, logging instead of failing.
pub async fn send_notice(bot: &Bot, chat_id: ChatId, text: &str) {
    let send_result = teloxide_retry!(
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .disable_link_preview(true)
            .await
    );
    if let Err(e) = send_result {
        log::warn!("Failed to send notice to {}: {}", chat_id, e);
    }
}

/// Warn the user privately about their first violation; if their DMs are
/// closed, fall back to a public mention in the chat.
pub async fn notify_warned_user(bot: &Bot, chat_id: ChatId, user: &User, verdict: Verdict) {
    let private_text = format!(
        "⚠️ Ваше сообщение удалено: {}.\nСледующее нарушение приведёт к исключению из чата.",
        verdict.reason()
    );

    let dm_result = teloxide_retry!(
        bot.send_message(ChatId::from(user.id), private_text.as_str())
            .await
    );

    if let Err(e) = dm_result {
        log::debug!("Could not DM a warning to {}: {}", user.id, e);
        let public_text = format!(
            "⚠️ {}, ваше сообщение удалено: {}. Это предупреждение; при повторном нарушении вы будете исключены.",
            user_mention_html(user),
            verdict.reason()
        );
        send_notice(bot, chat_id, &public_text).await;
    }
}
