use std::env;

use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Initialize logging with a level taken from the `BATTLESHIP_LOG` environment variable.
/// Defaults to `info` if the variable is not set or invalid. Output goes to
/// stderr so stdout stays free for machine-readable results.
pub fn init_logging() {
    let _ = TermLogger::init(level_from_env(), Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
}

fn level_from_env() -> LevelFilter {
    env::var("BATTLESHIP_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info)
}
