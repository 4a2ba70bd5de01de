// src/miner/nonce.rs
//! Start-nonce sources
//!
//! Each search starts from one value drawn here and walks upward with
//! wrapping arithmetic.

use crate::config::MinerConfig;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the first nonce of every search
pub trait NonceSource: Send + Sync {
    /// Next start nonce
    fn start_nonce(&self) -> u64;
}

/// Fresh generator seeded from the wall clock on every call
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockNonce;

impl NonceSource for ClockNonce {
    fn start_nonce(&self) -> u64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        StdRng::seed_from_u64(nanos).next_u64()
    }
}

/// Deterministic generator with a fixed seed
#[derive(Debug)]
pub struct SeededNonce {
    rng: Mutex<StdRng>,
}

impl SeededNonce {
    /// Creates a generator that yields the same sequence for the same seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NonceSource for SeededNonce {
    fn start_nonce(&self) -> u64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64()
    }
}

/// Always starts from the same nonce
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u64);

impl NonceSource for FixedNonce {
    fn start_nonce(&self) -> u64 {
        self.0
    }
}

/// Picks the source configured in `[miner]`
///
/// `nonce_seed` selects [`SeededNonce`]; otherwise [`ClockNonce`].
pub fn from_config(config: &MinerConfig) -> Box<dyn NonceSource> {
    match config.nonce_seed {
        Some(seed) => Box::new(SeededNonce::new(seed)),
        None => Box::new(ClockNonce),
    }
}
