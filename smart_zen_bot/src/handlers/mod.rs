use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    prelude::*,
    types::{BotCommand, ChatMemberUpdated, Me},
    RequestError,
};
use zen_bot_commons::{BotStuff, MessageStuff};

use crate::{
    actions::send_notice,
    llm::ASSISTANT_SYSTEM_PROMPT,
    misc::user_mention_html,
    moderation::moderate_message,
    types::BotState,
};

pub mod reviews;
pub use reviews::handle_callback_query;

pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("status", "Статистика модерации"),
        BotCommand::new("amnesty", "Снять предупреждение: /amnesty <user_id>"),
    ]
}

pub async fn handle_new_message(
    bot: Bot,
    me: Me,
    message: Message,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    handle_message(bot, me, message, state, true).await
}

/// Edits get re-moderated (sneaking spam in via an edit is a classic)
/// but must not count towards the flood window again.
pub async fn handle_edited_message(
    bot: Bot,
    me: Me,
    message: Message,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    handle_message(bot, me, message, state, false).await
}

async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    state: Arc<BotState>,
    count_for_flood: bool,
) -> Result<(), RequestError> {
    // Our own messages (notices, drafts) are nobody's business to
    // moderate.
    if message
        .from
        .as_ref()
        .is_some_and(|user| user.id == me.user.id)
    {
        return Ok(());
    }

    if message.chat.is_private() {
        return handle_private_message(bot, message, state).await;
    }

    moderate_message(&bot, &state, &message, count_for_flood).await
}

/// Greet members coming into the chat. Telegram repeats status updates
/// for promotions and restrictions; only the not-present to present
/// transition gets a greeting, so re-sends don't happen.
pub async fn handle_chat_member_update(
    bot: Bot,
    update: ChatMemberUpdated,
) -> Result<(), RequestError> {
    if update.old_chat_member.is_present() || !update.new_chat_member.is_present() {
        return Ok(());
    }

    let user = &update.new_chat_member.user;
    if user.is_bot {
        return Ok(());
    }

    let text = format!(
        "👋 Добро пожаловать, {}! Загляните в закреплённое сообщение с правилами чата.",
        user_mention_html(user)
    );
    send_notice(&bot, update.chat.id, &text).await;
    Ok(())
}

/// The private surface belongs to the administrator alone: commands,
/// plus free-text questions that go straight to the LLM. Anyone else
/// gets silence, not even an error.
async fn handle_private_message(
    bot: Bot,
    message: Message,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    let Some(user) = &message.from else {
        return Ok(());
    };

    if user.id != state.config.admin_user_id {
        log::debug!("Ignoring a private message from non-admin {}", user.id);
        return Ok(());
    }

    let Some(text) = message.text_full() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return handle_command(&bot, &message, &state, text).await;
    }

    // Free-text question: forward to the LLM, with a typing indicator
    // while it thinks.
    let _ = bot.typing(message.chat.id).await;
    match state.llm.complete(ASSISTANT_SYSTEM_PROMPT, text).await {
        Ok(answer) => {
            bot.send_message(message.chat.id, answer).await?;
        }
        Err(e) => {
            log::warn!("LLM query failed: {e}");
            bot.send_message(message.chat.id, "⚠️ Временно не могу ответить.")
                .await?;
        }
    }
    Ok(())
}

async fn handle_command(
    bot: &Bot,
    message: &Message,
    state: &BotState,
    text: &str,
) -> Result<(), RequestError> {
    let Some(command) = text.split_whitespace().next() else {
        return Ok(());
    };
    let params = text[command.len()..].trim_start();

    match command {
        "/start" => {
            bot.send_message(
                message.chat.id,
                "🧠 Привет! Я слежу за порядком в чате и готовлю посты для канала.\n\n\
                 Команды: /status, /amnesty <user_id>.\n\
                 Любой другой текст — вопрос к ассистенту.",
            )
            .await?;
        }
        "/status" => {
            bot.send_message(message.chat.id, status_report(state))
                .await?;
        }
        "/amnesty" => match params.parse::<u64>() {
            Ok(user_id) => {
                if state.warnings.get(user_id) == 0 {
                    bot.send_message(
                        message.chat.id,
                        format!("У пользователя {user_id} нет предупреждений."),
                    )
                    .await?;
                } else {
                    if let Err(e) = state.warnings.remove(user_id) {
                        log::error!("Failed to persist the warnings file: {e}");
                    }
                    bot.send_message(
                        message.chat.id,
                        format!("Предупреждение пользователя {user_id} снято."),
                    )
                    .await?;
                }
            }
            Err(_) => {
                bot.send_message(message.chat.id, "Использование: /amnesty <user_id>")
                    .await?;
            }
        },
        _ => {
            bot.send_message(
                message.chat.id,
                "Не знаю такой команды. Есть /status и /amnesty <user_id>.",
            )
            .await?;
        }
    }
    Ok(())
}

fn status_report(state: &BotState) -> String {
    let uptime = Utc::now() - state.stats.started_at();
    format!(
        "📊 Статус бота\n\n\
         Активных предупреждений: {}\n\
         Пользователей во флуд-окне: {}\n\
         Удалено сообщений: {}\n\
         Исключено пользователей: {}\n\
         Аптайм: {}д {}ч {}м",
        state.warnings.len(),
        state.flood.tracked_users(),
        state.stats.deleted(),
        state.stats.kicked(),
        uptime.num_days(),
        uptime.num_hours() % 24,
        uptime.num_minutes() % 60,
    )
}
