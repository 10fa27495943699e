use std::{fs, sync::Arc, time::Duration};

use teloxide::{dptree::deps, prelude::*};

use crate::{
    config::Config,
    handlers,
    llm::LlmClient,
    moderation::flood::FloodTracker,
    publishing::{news::news_spinloop, rates::rates_spinloop, ApprovalQueue},
    storage::{DedupCursor, WarningStore},
    types::{BotState, ModerationStats},
};

/// # Panics
///
/// Panics if there's no key file or the environment is misconfigured.
pub async fn entry() {
    log::info!("ASYNC WOOOO");
    let key = fs::read_to_string(match cfg!(debug_assertions) {
        true => "key_debug",
        false => "key",
    })
    .expect("Could not load bot key file!");

    let bot = Bot::new(key.trim());

    let config = Config::from_env();

    bot.set_my_commands(handlers::generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let state = Arc::new(BotState {
        warnings: WarningStore::load(&config.warnings_path),
        flood: FloodTracker::new(),
        queue: ApprovalQueue::new(),
        news_cursor: DedupCursor::load(&config.news_cursor_path),
        rates_cursor: DedupCursor::load(&config.rates_cursor_path),
        stats: ModerationStats::new(),
        llm: LlmClient::new(config.groq_api_key.clone()),
        http: reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build the HTTP client!"),
        config,
    });

    tokio::spawn(news_spinloop(bot.clone(), Arc::downgrade(&state)));
    tokio::spawn(rates_spinloop(bot.clone(), Arc::downgrade(&state)));

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_new_message))
        .branch(Update::filter_edited_message().endpoint(handlers::handle_edited_message))
        .branch(Update::filter_chat_member().endpoint(handlers::handle_chat_member_update))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback_query));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
