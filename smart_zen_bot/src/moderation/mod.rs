//! The moderation engine. Each group message goes through flood
//! accounting, then classification, then delete-and-escalate. Escalation
//! is warn on the first violation and kick on the second; the kick also
//! clears the warning so a returning user starts over.

pub mod classify;
pub mod flood;
pub mod normalize;

use std::time::Instant;

use teloxide::{types::Message, Bot, RequestError};
use zen_bot_commons::MessageStuff;

use crate::{
    actions::{delete_message_best_effort, kick_user, notify_warned_user, send_notice},
    misc::user_mention_html,
    types::{BotState, Verdict},
};

use self::flood::FloodVerdict;

/// What the engine does about a violation, given how many warnings the
/// user already carries. First offense warns; anything after that kicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Warn,
    Kick,
}

pub fn escalation_for(warning_count: u32) -> Escalation {
    if warning_count == 0 {
        Escalation::Warn
    } else {
        Escalation::Kick
    }
}

/// Moderate one group message. `count_for_flood` is false for edits,
/// which would otherwise double-count in the flood window.
pub async fn moderate_message(
    bot: &Bot,
    state: &BotState,
    message: &Message,
    count_for_flood: bool,
) -> Result<(), RequestError> {
    let Some(user) = &message.from else {
        // Channel posts and service messages have no sender to escalate.
        return Ok(());
    };

    if count_for_flood
        && state.flood.record_and_check(user.id.0, Instant::now()) == FloodVerdict::Flood
    {
        log::info!("Flood from user {} in {}", user.id, message.chat.id);
        kick_user(bot, message.chat.id, user).await;
        state.stats.count_kicked();
        state.flood.clear(user.id.0);
        send_notice(
            bot,
            message.chat.id,
            &format!("🚫 {} исключён из чата за флуд.", user_mention_html(user)),
        )
        .await;
        // A flood verdict short-circuits everything else.
        return Ok(());
    }

    // Pure media with no caption gets no further scrutiny; the flood
    // accounting above already happened.
    let Some(text) = message.text_full() else {
        return Ok(());
    };

    let verdict = classify::classify(text);
    if verdict == Verdict::Clean {
        return Ok(());
    }

    log::info!(
        "Violation ({:?}) from user {} in {}: {}",
        verdict,
        user.id,
        message.chat.id,
        text
    );

    // The counter goes up regardless of whether the delete stuck; a
    // violation was detected either way.
    delete_message_best_effort(bot, message).await;
    state.stats.count_deleted();

    let user_id = user.id.0;
    match escalation_for(state.warnings.get(user_id)) {
        Escalation::Warn => {
            if let Err(e) = state.warnings.set(user_id, 1) {
                log::error!("Failed to persist the warnings file: {e}");
            }
            notify_warned_user(bot, message.chat.id, user, verdict).await;
        }
        Escalation::Kick => {
            kick_user(bot, message.chat.id, user).await;
            if let Err(e) = state.warnings.remove(user_id) {
                log::error!("Failed to persist the warnings file: {e}");
            }
            state.stats.count_kicked();
            send_notice(
                bot,
                message.chat.id,
                &format!(
                    "🚫 {} исключён из чата за повторное нарушение.",
                    user_mention_html(user)
                ),
            )
            .await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::storage::WarningStore;

    #[test]
    fn warn_then_kick() {
        let dir = tempfile::tempdir().unwrap();
        let store = WarningStore::load(&dir.path().join("warnings.json"));

        // First violation: a warning goes on record, nobody is kicked.
        assert_eq!(escalation_for(store.get(7)), Escalation::Warn);
        store.set(7, 1).unwrap();
        assert_eq!(store.get(7), 1);

        // Second violation: kick, and the record is cleared so a
        // returning user starts over.
        assert_eq!(escalation_for(store.get(7)), Escalation::Kick);
        store.remove(7).unwrap();
        assert_eq!(store.get(7), 0);
        assert_eq!(escalation_for(store.get(7)), Escalation::Warn);
    }
}
