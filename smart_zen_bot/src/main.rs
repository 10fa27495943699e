use zen_bot_commons::*;

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "WARNING,smart_zen_bot=debug");
    }
    start_everything(smart_zen_bot::entry());
}
