// src/config/validate.rs

use crate::config::model::{Config, LogSection, RawConfig, RawLogSection, RuntimeSection};
use crate::errors::{AppError, Result};
use crate::logging::parse_level_str;

/// Upper bound for an explicit `worker_threads` setting.
pub const MAX_WORKER_THREADS: usize = 4096;

impl TryFrom<RawConfig> for Config {
    type Error = AppError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_runtime(&raw.runtime)?;
        let log = validate_log(&raw.log)?;
        Ok(Config::new_unchecked(raw.runtime, log))
    }
}

/// Validate a worker count coming from either the file or the CLI.
pub fn validate_worker_threads(n: usize) -> Result<()> {
    if n == 0 {
        return Err(AppError::ConfigError(
            "[runtime].worker_threads must be >= 1 (got 0)".to_string(),
        ));
    }
    if n > MAX_WORKER_THREADS {
        return Err(AppError::ConfigError(format!(
            "[runtime].worker_threads must be <= {MAX_WORKER_THREADS} (got {n})"
        )));
    }
    Ok(())
}

fn validate_runtime(runtime: &RuntimeSection) -> Result<()> {
    match runtime.worker_threads {
        Some(n) => validate_worker_threads(n),
        None => Ok(()),
    }
}

fn validate_log(log: &RawLogSection) -> Result<LogSection> {
    let level = match log.level.as_deref() {
        None => None,
        Some(s) => Some(parse_level_str(s).ok_or_else(|| {
            AppError::ConfigError(format!(
                "[log].level: unknown level {s:?} (expected error, warn, info, debug or trace)"
            ))
        })?),
    };
    Ok(LogSection { level })
}
