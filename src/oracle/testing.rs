// src/oracle/testing.rs
//! Cheap instrumented oracle for unit tests
//!
//! Buffers are a few hundred bytes and every call is counted, so tests can
//! assert exactly when caches and datasets get rebuilt.

use crate::epoch::epoch_number;
use crate::oracle::{HashOracle, SizingParams};
use ethereum_types::H256;
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub(crate) struct CountingOracle {
    pub cache_builds: AtomicUsize,
    pub dataset_builds: AtomicUsize,
    pub full_hashes: AtomicUsize,
    pub light_hashes: AtomicUsize,
}

impl CountingOracle {
    pub fn cache_builds(&self) -> usize {
        self.cache_builds.load(Ordering::SeqCst)
    }

    pub fn dataset_builds(&self) -> usize {
        self.dataset_builds.load(Ordering::SeqCst)
    }

    pub fn full_hashes(&self) -> usize {
        self.full_hashes.load(Ordering::SeqCst)
    }

    pub fn light_hashes(&self) -> usize {
        self.light_hashes.load(Ordering::SeqCst)
    }

    fn derive_dataset(cache: &[u8], dataset: &mut [u8]) {
        for (i, byte) in dataset.iter_mut().enumerate() {
            *byte = cache[i % cache.len()].wrapping_add(i as u8);
        }
    }

    fn digest(dataset: &[u8], header: &H256, nonce: u64) -> (H256, H256) {
        let result = Keccak256::new()
            .chain_update(dataset)
            .chain_update(header.as_bytes())
            .chain_update(nonce.to_le_bytes())
            .finalize();
        let mix = Keccak256::digest(result);
        (H256::from_slice(&result), H256::from_slice(&mix))
    }
}

impl HashOracle for CountingOracle {
    fn sizing_params(&self, epoch: u64) -> SizingParams {
        let ordinal = epoch_number(epoch) as usize;
        SizingParams {
            epoch,
            cache_size: 64 * (ordinal + 1),
            dataset_size: 256 * (ordinal + 1),
        }
    }

    fn build_cache(&self, _params: &SizingParams, seed: &H256, cache: &mut [u8]) {
        self.cache_builds.fetch_add(1, Ordering::SeqCst);
        for (i, byte) in cache.iter_mut().enumerate() {
            *byte = seed.as_bytes()[i % 32] ^ (i as u8);
        }
    }

    fn build_dataset(&self, _params: &SizingParams, cache: &[u8], dataset: &mut [u8]) {
        self.dataset_builds.fetch_add(1, Ordering::SeqCst);
        Self::derive_dataset(cache, dataset);
    }

    fn full_hash(
        &self,
        dataset: &[u8],
        _params: &SizingParams,
        header: &H256,
        nonce: u64,
    ) -> (H256, H256) {
        self.full_hashes.fetch_add(1, Ordering::SeqCst);
        Self::digest(dataset, header, nonce)
    }

    fn light_hash(&self, cache: &[u8], params: &SizingParams, header: &H256, nonce: u64) -> H256 {
        self.light_hashes.fetch_add(1, Ordering::SeqCst);
        let mut dataset = vec![0u8; params.dataset_size];
        Self::derive_dataset(cache, &mut dataset);
        Self::digest(&dataset, header, nonce).0
    }
}
