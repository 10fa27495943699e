//! Source code for Smart Zen Bot, a chat moderation and channel
//! publication bot for Telegram.
//!
//! The bot screens group messages for spam phrases, links to foreign
//! channels, profanity and flooding, escalating offenders from a warning
//! to a kick. Independently it polls a news feed and the central bank's
//! exchange rates, drafts posts through an LLM, and publishes them to a
//! channel once the administrator approves.

/// Runtime configuration pulled from the environment.
mod config;

/// Various types used throughout.
mod types;

/// Miscellaneous functions.
mod misc;

/// Flat-file persistent state: the warnings map and dedup cursors.
mod storage;

/// Message screening: normalizer, classifier, flood detector and the
/// moderation engine itself.
mod moderation;

/// Functions that perform stuff via the bot.
mod actions;

/// Client for the LLM completion API.
mod llm;

/// Periodic news and exchange-rate pollers, plus the approval queue.
mod publishing;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
