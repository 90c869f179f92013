//! Configuration management for hostpilot

mod settings;

pub use settings::{Config, RetrySettings, CONFIG_FILE_NAMES, DEFAULT_REGISTRY_PREFIX};
