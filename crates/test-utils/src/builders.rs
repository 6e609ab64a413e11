#![allow(dead_code)]

use lifeline::config::{Config, RawConfig, RawLogSection, RuntimeSection};

/// Builder for `Config` to simplify test setup.
pub struct RawConfigBuilder {
    config: RawConfig,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfig {
                runtime: RuntimeSection::default(),
                log: RawLogSection::default(),
            },
        }
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.config.runtime.worker_threads = Some(n);
        self
    }

    pub fn ignore_cpu_quota(mut self) -> Self {
        self.config.runtime.respect_cpu_quota = false;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.log.level = Some(level.to_string());
        self
    }

    pub fn raw(self) -> RawConfig {
        self.config
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
