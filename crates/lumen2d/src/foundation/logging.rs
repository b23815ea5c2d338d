//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    // A second init (tests, embedding apps with their own logger) is harmless.
    let _ = env_logger::try_init();
}

/// Initialize the logging system with a default level filter
///
/// `RUST_LOG` still overrides `level` when set. Unknown level names fall
/// back to `info`.
pub fn init_with_level(level: &str) {
    let filter = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}
