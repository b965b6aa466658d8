use std::process::ExitCode;

use env_logger::{Builder, Env};
use log::error;

/// Фильтр логов из MIXTAPE_LOG (синтаксис как у RUST_LOG), по умолчанию — info.
fn init_logger() {
    let env = Env::default().filter_or("MIXTAPE_LOG", "info");
    Builder::from_env(env)
        .format_target(false)
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    init_logger();

    match mixtape::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // сюда доходят только ошибки Loader/Writer
            error!("{}", e);
            for cause in e.chain().skip(1) {
                error!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
