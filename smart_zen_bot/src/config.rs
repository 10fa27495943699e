use std::path::PathBuf;

use teloxide::types::{ChatId, UserId};

/// News feed polled for publication candidates.
const DEFAULT_NEWS_FEED_URL: &str =
    "https://news.google.com/rss/search?q=%D0%93%D1%80%D1%83%D0%B7%D0%B8%D1%8F&hl=ru";

/// Official exchange rates of the National Bank of Georgia.
const DEFAULT_RATES_URL: &str = "https://nbg.gov.ge/gw/api/ct/monetarypolicy/currencies/ru/json";

/// Everything configurable about this bot, read from the environment
/// once at startup. The bot key itself lives in the `key` file instead,
/// like with the other bots.
pub struct Config {
    /// The only person allowed to use the private command surface and
    /// the publish/reject buttons.
    pub admin_user_id: UserId,
    /// Channel that approved drafts get published to.
    pub target_channel_id: ChatId,
    pub groq_api_key: String,
    pub news_feed_url: String,
    pub rates_url: String,
    pub warnings_path: PathBuf,
    pub news_cursor_path: PathBuf,
    pub rates_cursor_path: PathBuf,
}

impl Config {
    /// # Panics
    ///
    /// Panics if a required environment variable is missing or malformed.
    /// Better to die on startup than to limp along misconfigured.
    pub fn from_env() -> Config {
        fn required(name: &str) -> String {
            std::env::var(name)
                .unwrap_or_else(|_| panic!("Environment variable {name} is not set!"))
        }
        fn or_default(name: &str, default: &str) -> String {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        }

        let admin_user_id = UserId(
            required("ADMIN_USER_ID")
                .parse()
                .expect("ADMIN_USER_ID must be a numeric Telegram user ID!"),
        );
        let target_channel_id = ChatId(
            required("TARGET_CHANNEL_ID")
                .parse()
                .expect("TARGET_CHANNEL_ID must be a numeric Telegram chat ID!"),
        );

        let data_dir = PathBuf::from(or_default("DATA_DIR", "."));

        Config {
            admin_user_id,
            target_channel_id,
            groq_api_key: required("GROQ_API_KEY"),
            news_feed_url: or_default("NEWS_FEED_URL", DEFAULT_NEWS_FEED_URL),
            rates_url: or_default("RATES_URL", DEFAULT_RATES_URL),
            warnings_path: data_dir.join("warnings.json"),
            news_cursor_path: data_dir.join("last_news_id.txt"),
            rates_cursor_path: data_dir.join("last_rates.txt"),
        }
    }
}
