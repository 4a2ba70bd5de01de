// src/chain.rs
//! Chain collaborator
//!
//! The DAG managers only need two things from the chain: the current height
//! and the canonical seed hash of an epoch.

use crate::epoch::epoch_number;
use crate::oracle::ethash::seed_hash;
use ethereum_types::H256;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read access to the chain the miner works on
pub trait ChainReader: Send + Sync {
    /// Height of the current head
    fn current_height(&self) -> u64;

    /// Canonical seed hash for an epoch id
    fn seed_hash_for_epoch(&self, epoch: u64) -> H256;
}

/// In-process chain with a movable head and canonical Ethash seed hashes
#[derive(Debug, Default)]
pub struct LocalChain {
    height: AtomicU64,
}

impl LocalChain {
    /// Creates a chain whose head is at `height`
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Moves the head
    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Advances the head by one block and returns the new height
    pub fn advance(&self) -> u64 {
        self.height.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl ChainReader for LocalChain {
    fn current_height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    fn seed_hash_for_epoch(&self, epoch: u64) -> H256 {
        seed_hash(epoch_number(epoch))
    }
}
