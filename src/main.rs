use std::io::Write;

use chess_search::uci::UciEngine;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"))
        .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();

    let result = UciEngine::new().and_then(|mut engine| engine.run());
    if let Err(e) = result {
        log::error!("fatal error: {e}");
        std::process::exit(1);
    }
}
