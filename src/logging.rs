//! Logger setup for the binary.

use log::LevelFilter;

/// Environment variable that sets the log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

const LEVELS: [(&str, LevelFilter); 4] = [
    ("DEBUG", LevelFilter::Debug),
    ("INFO", LevelFilter::Info),
    ("WARN", LevelFilter::Warn),
    ("ERROR", LevelFilter::Error),
];

/// Parses a `LOG_LEVEL` value, ignoring case.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    let value = value.trim().to_ascii_uppercase();
    LEVELS
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, level)| *level)
}

/// Installs the logger, at `info` unless `LOG_LEVEL` says otherwise.
///
/// Calling this more than once is harmless.
pub fn init() {
    let requested = std::env::var(LOG_LEVEL_ENV).ok();
    let level = requested.as_deref().and_then(parse_level);

    let installed = env_logger::Builder::new()
        .filter_level(level.unwrap_or(LevelFilter::Info))
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .is_ok();
    if !installed {
        return;
    }

    match (requested, level) {
        (Some(value), None) => log::warn!(
            "Found {:?} env var, but log level was not one of {:?}: {:?}",
            LOG_LEVEL_ENV,
            LEVELS.map(|(name, _)| name),
            value
        ),
        (Some(_), Some(level)) => log::debug!("Set logging level to {} from env var", level),
        (None, _) => {}
    }
}
