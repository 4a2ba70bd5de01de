// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the nonce search:
//! - The search loop over the full dataset
//! - Start-nonce sources
//! - Cancellation signals

/// Cancellation signals polled by the search loop
pub mod cancel;

/// Start-nonce generation
///
/// Wall-clock seeded by default, fixed-seed for reproducible runs.
pub mod nonce;

/// Mining coordinator
///
/// Holds both DAG locks for the length of a search and publishes the
/// hash rate.
pub mod search;

// Re-export main components for cleaner imports
pub use self::cancel::{CancelSignal, Never};
pub use self::nonce::{ClockNonce, FixedNonce, NonceSource, SeededNonce};
pub use self::search::MiningCoordinator;
