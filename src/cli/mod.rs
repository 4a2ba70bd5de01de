//! Command-line interface definitions

/// Clap argument structures for every subcommand
pub mod commands;

pub use commands::{
    Action, BenchOptions, Commands, ConfigOptions, DagOptions, MineOptions, RunOptions,
    VerifyOptions, parse_difficulty,
};
