//! Ethash Miner - epoch-scoped Ethash DAG management, mining and verification
//!
//! This crate keeps exactly one light cache and one full dataset (DAG) live
//! per process and coordinates access to them:
//! - Epoch derivation and per-epoch cache/dataset sizing
//! - Dataset persistence and reuse across restarts
//! - Nonce search over the full dataset, cancellable at any attempt
//! - Light verification, including blocks from older epochs
//! - Hardware and hash-rate reporting

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Chain collaborator trait and an in-process chain
pub mod chain;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared cache/dataset state
pub mod context;

/// Cache and dataset lifecycle, buffers and the dataset file
pub mod dag;

/// Public proof-of-work facade
pub mod engine;

/// Epoch arithmetic
pub mod epoch;

/// Nonce search, start-nonce sources and cancellation
pub mod miner;

/// Proof-of-work hash oracle trait and the Ethash implementation
pub mod oracle;

/// Statistics collection and reporting functionality
pub mod stats;

/// Shared type definitions
pub mod types;

/// Utility functions and error handling
pub mod utils;

/// Light proof-of-work verification
pub mod verifier;

// Core exports
pub use chain::{ChainReader, LocalChain};
pub use cli::Commands;
pub use config::Config;
pub use context::PowContext;
pub use dag::{Cache, CacheManager, DagBuffer, DagStore, Dataset, DatasetManager};
pub use engine::PowEngine;
pub use epoch::{EPOCH_LENGTH, epoch_of};
pub use miner::{CancelSignal, MiningCoordinator, NonceSource};
pub use oracle::{HashOracle, SizingParams};
pub use stats::{HardwareStats, HashRate, StatsReporter};
pub use types::{Header, PowBlock, SearchOutcome, SizingProfile, Solution};
pub use utils::{MinerError, init_logging};
pub use verifier::Verifier;
