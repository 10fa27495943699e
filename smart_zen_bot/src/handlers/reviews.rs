//! The administrator's side of the approval queue: button presses on
//! review messages come in here as callback queries.

use std::sync::Arc;

use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters},
    prelude::*,
    types::InlineKeyboardMarkup,
    RequestError,
};
use zen_bot_commons::teloxide_retry;

use crate::{
    misc::user_name_prettyprint,
    types::{BotState, ReviewAction},
};

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    macro_rules! goodbye {
        ($text:expr) => {{
            bot.answer_callback_query(query.id.clone()).text($text).await?;
            return Ok(());
        }};
        () => {{
            bot.answer_callback_query(query.id.clone()).await?;
            return Ok(());
        }};
    }

    // The keyboards only ever go to the admin's chat, but the payload
    // arrives from the network, so verify anyway.
    if query.from.id != state.config.admin_user_id {
        log::info!(
            "Unauthorized callback from {}",
            user_name_prettyprint(&query.from, true)
        );
        goodbye!();
    }

    let Some(data) = query.data.as_deref() else {
        goodbye!("Нет данных запроса.");
    };

    let action = match ReviewAction::from_callback_data(data) {
        Ok(action) => action,
        Err(e) => {
            goodbye!(format!("Некорректные данные: {e}"));
        }
    };

    let review_message = query
        .message
        .as_ref()
        .and_then(|message| message.regular_message());

    match action {
        ReviewAction::Reject => {
            // Nothing to look up: the reject button carries no token and
            // the parked draft simply ages out of the queue.
            if let Some(message) = review_message {
                mark_review_done(&bot, message, "❌ Отклонено.").await;
            }
            goodbye!("Черновик отклонён.");
        }
        ReviewAction::Publish(token) => {
            let Some(draft) = state.queue.take(&token) else {
                // Double tap, or a draft from before a restart. Expected.
                goodbye!("Данные устарели.");
            };

            match teloxide_retry!(
                bot.send_message(state.config.target_channel_id, draft.as_str())
                    .await
            ) {
                Ok(_) => {
                    log::info!("Published a draft to {}", state.config.target_channel_id);
                    if let Some(message) = review_message {
                        mark_review_done(&bot, message, "✅ Опубликовано.").await;
                    }
                    goodbye!("Опубликовано ✅");
                }
                Err(e) => {
                    log::error!("Failed to publish a draft: {e}");
                    goodbye!(format!("Ошибка публикации: {e}"));
                }
            }
        }
    }
}

/// Strip the buttons off a handled review message and append the
/// outcome, so the admin's chat history shows what happened to what.
async fn mark_review_done(bot: &Bot, message: &Message, outcome: &str) {
    let original = message.text().unwrap_or_default();
    let edit_result = bot
        .edit_message_text(
            message.chat.id,
            message.id,
            format!("{original}\n\n{outcome}"),
        )
        .reply_markup(InlineKeyboardMarkup {
            inline_keyboard: Vec::new(),
        })
        .await;

    if let Err(e) = edit_result {
        // Cosmetic edit; the answer callback already told the admin.
        log::debug!("Failed to edit a review message: {e}");
    }
}
