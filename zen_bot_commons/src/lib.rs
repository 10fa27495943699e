//! Common glue for the zen bots: logging and runtime bootstrap, a retry
//! macro for flaky Telegram calls, and small extension traits.

use std::future::Future;

pub mod useful_methods;
pub use useful_methods::*;

/// Initialize logging and start the `closure` in an async runtime.
/// Logging is enabled by default on level `info` unless overridden
/// by environment variable `RUST_LOG`. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(closure: impl Future<Output = ()>) {
    let log_level = std::env::var_os("RUST_LOG")
        .unwrap_or_else(|| std::ffi::OsString::from("info"))
        .into_string()
        .unwrap_or_else(|_| String::from("info"));

    // The journal timestamps lines on its own.
    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_level);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("hi");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(closure);
}

/// Run a teloxide request, retrying a few times if Telegram rate limits
/// us or the network flakes out. Any other outcome is returned as-is.
#[macro_export]
macro_rules! teloxide_retry {
    ($call:expr) => {{
        let mut attempts: u8 = 0;
        loop {
            let result = $call;
            match &result {
                Err(teloxide::RequestError::RetryAfter(seconds)) if attempts < 3 => {
                    attempts += 1;
                    tokio::time::sleep(seconds.duration()).await;
                }
                Err(teloxide::RequestError::Network(_)) if attempts < 3 => {
                    attempts += 1;
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                _ => break result,
            }
        }
    }};
}
