// src/config/mod.rs
//! Configuration management for the miner
//!
//! TOML configuration with a default for every field, plus a commented
//! template generator for the `config` subcommand.

/// Core configuration implementation
///
/// Contains the [`Config`] struct and its sections.
pub mod config;

// Re-export key items for easy access
pub use config::{Config, DagConfig, MinerConfig, StatsConfig, VerifierConfig};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read or parsed
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
pub fn generate_template() -> String {
    Config::generate_template()
}
