// src/cli/commands.rs
use crate::types::SizingProfile;
use clap::{Args, Parser, Subcommand};
use ethereum_types::U256;
use std::path::PathBuf;

/// Ethash Miner CLI - epoch-scoped DAG management, mining and verification
#[derive(Parser, Debug)]
#[command(name = "ethash-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Mine blocks on a local chain and verify each one
    Mine(MineOptions),

    /// Check a single proof of work
    Verify(VerifyOptions),

    /// Generate (or load) and persist the DAG for a height
    Dag(DagOptions),

    /// Measure the full-hash rate for a fixed duration
    Bench(BenchOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options shared by every command that builds an engine
#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ethash size table (overrides config)
    #[arg(short, long)]
    pub sizing: Option<SizingProfile>,

    /// DAG file location (overrides config)
    #[arg(long)]
    pub dag_path: Option<PathBuf>,

    /// Threads for DAG generation (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Options for mining on a local chain
#[derive(Parser, Debug)]
pub struct MineOptions {
    #[command(flatten)]
    pub run: RunOptions,

    /// Height of the chain head before the first mined block
    #[arg(long, default_value_t = 0)]
    pub height: u64,

    /// Number of blocks to mine
    #[arg(short, long, default_value_t = 1)]
    pub blocks: u64,

    /// Block difficulty (decimal)
    #[arg(short, long, default_value = "100000", value_parser = parse_difficulty)]
    pub difficulty: U256,

    /// Give up on a block after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Sleep between hash attempts (overrides config)
    #[arg(long)]
    pub no_turbo: bool,
}

/// Options for verifying one proof
#[derive(Parser, Debug)]
pub struct VerifyOptions {
    #[command(flatten)]
    pub run: RunOptions,

    /// Block height
    #[arg(long)]
    pub height: u64,

    /// Block difficulty (decimal)
    #[arg(short, long, value_parser = parse_difficulty)]
    pub difficulty: U256,

    /// Header hash without nonce (32 bytes hex)
    #[arg(long)]
    pub header: String,

    /// Nonce (8 bytes big-endian hex)
    #[arg(short, long)]
    pub nonce: String,

    /// Mix digest (32 bytes hex)
    #[arg(short, long)]
    pub mix: String,

    /// Seed hash (32 bytes hex, default: canonical seed for the height)
    #[arg(long)]
    pub seed: Option<String>,
}

/// Options for pre-generating the DAG
#[derive(Parser, Debug)]
pub struct DagOptions {
    #[command(flatten)]
    pub run: RunOptions,

    /// Height whose epoch the DAG is built for
    #[arg(long, default_value_t = 0)]
    pub height: u64,
}

/// Options for running the hash-rate benchmark
#[derive(Parser, Debug)]
pub struct BenchOptions {
    #[command(flatten)]
    pub run: RunOptions,

    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Height whose epoch the DAG is built for
    #[arg(long, default_value_t = 0)]
    pub height: u64,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,
}

/// Parses a decimal difficulty into a U256
pub fn parse_difficulty(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| format!("invalid difficulty {}: {:?}", s, e))
}
