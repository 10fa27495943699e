use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    llm::LlmClient,
    moderation::flood::FloodTracker,
    publishing::ApprovalQueue,
    storage::{DedupCursor, WarningStore},
};

/// Everything the handlers and pollers share. One of these is built in
/// [`crate::entry`] and injected into the dispatcher; the pollers get a
/// `Weak` to it so they die together with the dispatcher.
pub struct BotState {
    pub config: Config,
    pub warnings: WarningStore,
    pub flood: FloodTracker,
    pub queue: ApprovalQueue,
    pub news_cursor: DedupCursor,
    pub rates_cursor: DedupCursor,
    pub stats: ModerationStats,
    pub llm: LlmClient,
    /// Plain HTTP client for feed and rate fetches.
    pub http: reqwest::Client,
}

/// What the classifier thinks of a message. Evaluation order is
/// stop-phrase, link, profanity; first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    StopPhrase,
    DisallowedLink,
    Profanity,
}

impl Verdict {
    /// Short human-readable reason, for deletion notices.
    pub fn reason(self) -> &'static str {
        match self {
            Verdict::Clean => "нет нарушений",
            Verdict::StopPhrase => "спам или реклама",
            Verdict::DisallowedLink => "ссылка на сторонний канал",
            Verdict::Profanity => "ненормативная лексика",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// What the administrator pressed on a review keyboard. Telegram hands
/// the button payload back to us as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// Publish the draft stored under this token.
    Publish(String),
    /// Drop the draft. Carries no token; the queue entry, if any,
    /// simply ages out.
    Reject,
}

impl ReviewAction {
    pub const REJECT_DATA: &'static str = "reject";

    pub fn publish_data(token: &str) -> String {
        format!("publish_{token}")
    }

    pub fn from_callback_data(data: &str) -> Result<Self, &'static str> {
        if data == Self::REJECT_DATA {
            return Ok(ReviewAction::Reject);
        }
        if let Some(token) = data.strip_prefix("publish_") {
            if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err("Malformed publish token");
            }
            return Ok(ReviewAction::Publish(token.to_string()));
        }
        Err("Unknown action type")
    }
}

/// Process-lifetime moderation counters. Only the moderation engine
/// writes these; `/status` reads them. A restart resets them.
pub struct ModerationStats {
    deleted_messages: AtomicU64,
    kicked_users: AtomicU64,
    started_at: DateTime<Utc>,
}

impl ModerationStats {
    pub fn new() -> Self {
        ModerationStats {
            deleted_messages: AtomicU64::new(0),
            kicked_users: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn count_deleted(&self) {
        self.deleted_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_kicked(&self) {
        self.kicked_users.fetch_add(1, Ordering::Relaxed);
    }

    pub fn deleted(&self) -> u64 {
        self.deleted_messages.load(Ordering::Relaxed)
    }

    pub fn kicked(&self) -> u64 {
        self.kicked_users.load(Ordering::Relaxed)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn review_action_round_trip() {
        let data = ReviewAction::publish_data("aB3xy9");
        assert_eq!(data, "publish_aB3xy9");
        assert_eq!(
            ReviewAction::from_callback_data(&data).unwrap(),
            ReviewAction::Publish("aB3xy9".to_string())
        );

        assert_eq!(
            ReviewAction::from_callback_data("reject").unwrap(),
            ReviewAction::Reject
        );
    }

    #[test]
    fn review_action_rejects_garbage() {
        assert!(ReviewAction::from_callback_data("").is_err());
        assert!(ReviewAction::from_callback_data("publish_").is_err());
        assert!(ReviewAction::from_callback_data("publish_with spaces").is_err());
        assert!(ReviewAction::from_callback_data("URL_SPAM 1 2 3").is_err());
    }

    #[test]
    fn stats_count() {
        let stats = ModerationStats::new();
        stats.count_deleted();
        stats.count_deleted();
        stats.count_kicked();
        assert_eq!(stats.deleted(), 2);
        assert_eq!(stats.kicked(), 1);
    }
}
