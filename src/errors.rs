// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Environment setup failed: {0}")]
    EnvironmentSetup(#[from] EnvironmentSetupError),

    #[error("Runner construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("task `{task}` failed: {source}")]
    Task {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("task `{task}` panicked")]
    TaskPanicked { task: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Dependency wiring failed before any task was started.
///
/// A factory that returns one of these owes the caller no cleanup.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("runner wiring is not implemented")]
    NotWired,

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("dependency `{dependency}` is unreachable: {source}")]
    Unreachable {
        dependency: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Platform tuning (CPU quota detection) could not complete.
#[derive(Error, Debug)]
pub enum EnvironmentSetupError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cgroup file {path}: {content:?}")]
    Malformed { path: String, content: String },

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AppError>;
