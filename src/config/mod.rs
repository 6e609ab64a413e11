// src/config/mod.rs

//! Configuration loading and validation for lifeline.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate worker sizing and log level (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{Config, LogSection, RawConfig, RawLogSection, RuntimeSection};
