//! Human-in-the-loop publication. Pollers produce drafts, the approval
//! queue parks them under one-shot tokens, and the administrator's
//! button press either publishes or drops them.

pub mod news;
pub mod rates;

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use rand::{distr::Alphanumeric, RngExt};
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    Bot, RequestError,
};
use zen_bot_commons::teloxide_retry;

use crate::{storage::DedupCursor, types::BotState, types::ReviewAction};

/// Errors in a poller cycle are all equally "skip this cycle and log",
/// so one boxed type covers fetching, parsing and drafting.
pub type CycleError = Box<dyn std::error::Error + Send + Sync>;

const TOKEN_LEN: usize = 16;

/// Review volume is low and the admin reacts within hours, so no timer
/// sweeps the queue; entries just get evicted when older than this next
/// time anyone touches the queue.
const ENTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct PendingPost {
    text: String,
    created: Instant,
}

/// Token → drafted post, process-lifetime only. Consuming a token
/// removes the entry; an unknown token is stale data, not an error.
pub struct ApprovalQueue {
    entries: Mutex<HashMap<String, PendingPost>>,
}

impl ApprovalQueue {
    pub fn new() -> ApprovalQueue {
        ApprovalQueue {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Park a draft and get a fresh token for it.
    pub fn insert(&self, text: String) -> String {
        let mut entries = self.entries.lock().expect("Approval queue lock poisoned");
        entries.retain(|_, post| post.created.elapsed() < ENTRY_TTL);

        let mut token = generate_token();
        while entries.contains_key(&token) {
            token = generate_token();
        }
        entries.insert(
            token.clone(),
            PendingPost {
                text,
                created: Instant::now(),
            },
        );
        token
    }

    /// Pop the draft for this token. `None` for unknown, already
    /// consumed, or expired tokens alike.
    pub fn take(&self, token: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("Approval queue lock poisoned");
        let post = entries.remove(token)?;
        if post.created.elapsed() >= ENTRY_TTL {
            return None;
        }
        Some(post.text)
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Park the draft, advance the dedup cursor, and show the draft to the
/// administrator with publish/reject buttons.
///
/// The cursor moves *before* any human decision on purpose: a rejected
/// or ignored candidate must not be re-offered every cycle for as long
/// as the upstream data stays unchanged.
pub async fn offer_for_review(
    bot: &Bot,
    state: &BotState,
    draft: String,
    cursor: &DedupCursor,
    fingerprint: &str,
) -> Result<(), RequestError> {
    let token = state.queue.insert(draft.clone());

    if let Err(e) = cursor.store(fingerprint) {
        log::error!("Failed to persist a dedup cursor: {e}");
    }

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Опубликовать", ReviewAction::publish_data(&token)),
        InlineKeyboardButton::callback("❌ Отклонить", ReviewAction::REJECT_DATA),
    ]]);

    teloxide_retry!(
        bot.send_message(ChatId::from(state.config.admin_user_id), draft.as_str())
            .reply_markup(keyboard.clone())
            .await
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_the_entry() {
        let queue = ApprovalQueue::new();
        let token = queue.insert("черновик".to_string());
        assert_eq!(queue.take(&token).as_deref(), Some("черновик"));
        // A double tap on the same button must come back stale.
        assert_eq!(queue.take(&token), None);
    }

    #[test]
    fn unknown_token_is_stale() {
        let queue = ApprovalQueue::new();
        assert_eq!(queue.take("nosuchtoken"), None);
    }

    #[test]
    fn tokens_are_unique_and_well_formed() {
        let queue = ApprovalQueue::new();
        let a = queue.insert("a".to_string());
        let b = queue.insert("b".to_string());
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        // Both entries stay live independently.
        assert_eq!(queue.take(&b).as_deref(), Some("b"));
        assert_eq!(queue.take(&a).as_deref(), Some("a"));
    }
}
