//! CLI command implementations

pub mod interactive;
