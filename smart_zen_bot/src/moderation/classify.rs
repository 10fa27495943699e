//! Pure message classification. The rules run in a fixed order and the
//! first match wins: stop-phrase, then links, then profanity. The caller
//! applies the consequences.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;
use crate::types::Verdict;

/// Whole-phrase spam patterns, matched case-insensitively against the
/// raw text. Word boundaries keep "в день" from firing inside longer
/// words.
static STOP_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bприсоединяйся к каналу\b",
        r"(?i)\bтысяч[иау]? в день\b",
        r"(?i)\bбыстрый заработок\b",
        r"(?i)\bпассивный доход\b",
        r"(?i)\bл[её]гкие деньги\b",
        r"(?i)\bпиши в личку\b",
        r"(?i)\bработа на дому\b",
        r"(?i)\bбез вложений\b",
        r"(?i)\bгарантированный доход\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Stop phrase regex will always be valid"))
    .collect()
});

/// Channel handles that are fine to link to.
static ALLOWED_HANDLES: &[&str] = &["georgia_rabota", "smart_zen_news", "smart_zen_bot"];

/// Matches both `t.me/handle` deep links and bare `@handle` mentions.
/// A lone "@" with nothing alphanumeric after it captures nothing.
static HANDLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bt\.me/|@)([A-Za-z0-9_]+)").expect("Handle regex will always be valid")
});

/// Profanity lexicon, matched whole-word against normalized text.
static PROFANITY: &[&str] = &[
    "пидар",
    "пидор",
    "пидарас",
    "пидорас",
    "хуй",
    "хуйня",
    "нахуй",
    "блядь",
    "бля",
    "сука",
    "суки",
    "ебать",
    "ебал",
    "ёбаный",
    "ебаный",
    "гандон",
    "мудак",
    "мудаки",
    "шлюха",
    "залупа",
];

/// All channel/user handles the message references, lowercased.
fn extract_handles(text: &str) -> Vec<String> {
    HANDLE_REGEX
        .captures_iter(text)
        .map(|captures| captures[1].to_lowercase())
        .collect()
}

/// Classify a message. Total over arbitrary text; empty input is clean.
pub fn classify(raw: &str) -> Verdict {
    if STOP_PHRASES.iter().any(|regex| regex.is_match(raw)) {
        return Verdict::StopPhrase;
    }

    let handles = extract_handles(raw);
    if !handles.is_empty()
        && !handles
            .iter()
            .any(|handle| ALLOWED_HANDLES.contains(&handle.as_str()))
    {
        return Verdict::DisallowedLink;
    }

    let normalized = normalize(raw);
    if normalized
        .split_whitespace()
        .any(|word| PROFANITY.contains(&word))
    {
        return Verdict::Profanity;
    }

    Verdict::Clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_phrase() {
        assert_eq!(
            classify("Присоединяйся к каналу, тысячи в день!"),
            Verdict::StopPhrase
        );
        assert_eq!(classify("Работа на дому, без вложений"), Verdict::StopPhrase);
    }

    #[test]
    fn profanity_through_lookalikes() {
        assert_eq!(classify("п1дaр"), Verdict::Profanity);
        assert_eq!(classify("иди НАХУЙ"), Verdict::Profanity);
    }

    #[test]
    fn allowlisted_handle_is_clean() {
        assert_eq!(classify("загляни в @georgia_rabota"), Verdict::Clean);
        assert_eq!(classify("https://t.me/georgia_rabota"), Verdict::Clean);
    }

    #[test]
    fn foreign_handle_is_flagged() {
        assert_eq!(classify("подробнее в @randomchan"), Verdict::DisallowedLink);
        assert_eq!(classify("смотри t.me/scamchan тут"), Verdict::DisallowedLink);
    }

    #[test]
    fn bare_at_captures_nothing() {
        assert_eq!(classify("пишите на почту @ главный офис"), Verdict::Clean);
    }

    #[test]
    fn one_allowed_handle_excuses_the_set() {
        // Policy: the message is flagged only when *none* of the
        // referenced handles are allowed.
        assert_eq!(
            classify("@georgia_rabota и @randomchan"),
            Verdict::Clean
        );
    }

    #[test]
    fn order_is_stop_phrase_first() {
        assert_eq!(
            classify("Пиши в личку @randomchan, сука"),
            Verdict::StopPhrase
        );
    }

    #[test]
    fn total_over_odd_inputs() {
        assert_eq!(classify(""), Verdict::Clean);
        assert_eq!(classify("Обычное сообщение про погоду."), Verdict::Clean);
        assert_eq!(classify("\u{0}\u{fffd}🙂"), Verdict::Clean);
    }
}
