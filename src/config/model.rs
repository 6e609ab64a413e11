// src/config/model.rs

use serde::Deserialize;
use tracing::Level;

use crate::config::validate::validate_worker_threads;
use crate::errors::Result;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runtime]
/// worker_threads = 4
/// respect_cpu_quota = true
///
/// [log]
/// level = "info"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub log: RawLogSection,
}

/// `[runtime]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Explicit worker thread count. Takes precedence over the CPU quota.
    #[serde(default)]
    pub worker_threads: Option<usize>,

    /// Derive the worker count from the cgroup CPU quota when no explicit
    /// count is configured.
    #[serde(default = "default_respect_cpu_quota")]
    pub respect_cpu_quota: bool,
}

fn default_respect_cpu_quota() -> bool {
    true
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            worker_threads: None,
            respect_cpu_quota: default_respect_cpu_quota(),
        }
    }
}

/// `[log]` section as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLogSection {
    #[serde(default)]
    pub level: Option<String>,
}

/// `[log]` section after validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSection {
    pub level: Option<Level>,
}

/// Validated configuration.
///
/// Only obtainable through `Config::try_from(RawConfig)` (or
/// [`Config::default`]), so consumers can rely on its invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    runtime: RuntimeSection,
    log: LogSection,
}

impl Config {
    pub(crate) fn new_unchecked(runtime: RuntimeSection, log: LogSection) -> Self {
        Self { runtime, log }
    }

    pub fn runtime(&self) -> &RuntimeSection {
        &self.runtime
    }

    pub fn log(&self) -> &LogSection {
        &self.log
    }

    /// Apply a CLI worker-thread override on top of the file config.
    pub fn with_worker_threads(mut self, worker_threads: Option<usize>) -> Result<Self> {
        if let Some(n) = worker_threads {
            validate_worker_threads(n)?;
            self.runtime.worker_threads = Some(n);
        }
        Ok(self)
    }
}
