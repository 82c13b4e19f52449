//! Configuration and file-set resolution

pub mod config;

pub use config::{ConfigError, PatternConfig, DEFAULT_CONFIG_PATH};
