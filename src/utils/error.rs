// src/utils/error.rs
use crate::dag::store::StoreError;
use std::io;
use thiserror::Error;

/// Main error type for the miner
///
/// Covers every failure the DAG managers, the miner and the verifier can
/// surface. Cancelled searches and invalid proofs are normal outcomes and
/// never show up here.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid caller input (zero difficulty, malformed nonce, bad hex)
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A cache or dataset buffer of the given size could not be allocated
    #[error("Failed to allocate {0} bytes for DAG buffer")]
    AllocationError(usize),

    /// Persisting the dataset failed in a way the caller must know about
    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),
}

/// Converts hex decoding errors into MinerError
///
/// Used when the CLI parses header hashes, seed hashes or mix digests.
/// Wraps the original error in an `InputError` variant.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InputError(format!("Hex conversion failed: {}", e))
    }
}

/// Converts TOML parsing errors into MinerError
impl From<toml::de::Error> for MinerError {
    fn from(e: toml::de::Error) -> Self {
        MinerError::ConfigError(format!("Invalid config format: {}", e))
    }
}
