// src/logging.rs

//! Logging setup for `lifeline` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `LIFELINE_LOG` environment variable (e.g. "info", "debug")
//! 3. `[log].level` from the config file
//! 4. default to `debug`
//!
//! Logs are sent to STDERR so that stdout stays free for the service.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no CLI level is given.
pub const LOG_ENV_VAR: &str = "LIFELINE_LOG";

/// Initialise global logging subscriber.
///
/// Must be called at most once per process.
pub fn init_logging(cli_level: Option<LogLevel>, config_level: Option<Level>) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|s| parse_level_str(&s));
    let level = resolve_level(cli_level, env_level, config_level);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from the sources in priority order.
pub fn resolve_level(
    cli_level: Option<LogLevel>,
    env_level: Option<Level>,
    config_level: Option<Level>,
) -> Level {
    cli_level
        .map(level_from_log_level)
        .or(env_level)
        .or(config_level)
        .unwrap_or(Level::DEBUG)
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_everything() {
        let level = resolve_level(Some(LogLevel::Warn), Some(Level::TRACE), Some(Level::INFO));
        assert_eq!(level, Level::WARN);
    }

    #[test]
    fn env_beats_config() {
        let level = resolve_level(None, Some(Level::ERROR), Some(Level::INFO));
        assert_eq!(level, Level::ERROR);
    }

    #[test]
    fn defaults_to_debug() {
        assert_eq!(resolve_level(None, None, None), Level::DEBUG);
    }

    #[test]
    fn parses_loose_level_names() {
        assert_eq!(parse_level_str(" Warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level_str("loud"), None);
    }
}
