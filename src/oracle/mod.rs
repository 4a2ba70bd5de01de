// src/oracle/mod.rs
//! Proof-of-work hash oracle
//!
//! The managers, miner and verifier never hash anything themselves; they go
//! through [`HashOracle`]. The crate ships one implementation:
//! - Ethash (Keccak-based, memory-hard, epoch-sized cache and dataset)

/// Ethash implementation of the oracle
pub mod ethash;

#[cfg(test)]
pub(crate) mod testing;

use ethereum_types::H256;

/// Buffer sizes for one epoch
///
/// Produced by the oracle; a cache or dataset buffer is only ever paired
/// with the params of its own epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingParams {
    /// Epoch id (boundary height) these params belong to
    pub epoch: u64,
    /// Cache size in bytes
    pub cache_size: usize,
    /// Dataset size in bytes
    pub dataset_size: usize,
}

/// Common interface for proof-of-work hash functions
///
/// All operations are pure over correctly sized buffers and cannot fail.
/// Buffers are allocated by the caller so that allocation failure stays an
/// explicit error on the caller's side.
pub trait HashOracle: Send + Sync {
    /// Cache and dataset sizes for an epoch id
    fn sizing_params(&self, epoch: u64) -> SizingParams;

    /// Fills `cache` (exactly `params.cache_size` bytes) from the seed hash
    fn build_cache(&self, params: &SizingParams, seed: &H256, cache: &mut [u8]);

    /// Fills `dataset` (exactly `params.dataset_size` bytes) from the cache
    fn build_dataset(&self, params: &SizingParams, cache: &[u8], dataset: &mut [u8]);

    /// Full-speed hash over the dataset
    ///
    /// # Returns
    /// `(result, mix_digest)`
    fn full_hash(
        &self,
        dataset: &[u8],
        params: &SizingParams,
        header: &H256,
        nonce: u64,
    ) -> (H256, H256);

    /// Light hash over the cache; returns only the result digest
    fn light_hash(&self, cache: &[u8], params: &SizingParams, header: &H256, nonce: u64) -> H256;

    /// Light hash that also yields the mix digest, if the oracle can provide it
    ///
    /// Verifiers use this to check a block's mix digest without the dataset.
    /// The default returns `None`.
    fn light_hash_with_mix(
        &self,
        cache: &[u8],
        params: &SizingParams,
        header: &H256,
        nonce: u64,
    ) -> Option<(H256, H256)> {
        let _ = (cache, params, header, nonce);
        None
    }
}
