// src/verifier.rs
//! Light proof-of-work verification
//!
//! Verification only needs a cache. Blocks of the live epoch (or newer)
//! go through the shared cache under its lock; blocks of an older epoch get
//! a throwaway cache built without any lock, so checking history never
//! evicts the cache the miner depends on.

use crate::config::VerifierConfig;
use crate::context::PowContext;
use crate::dag::Cache;
use crate::epoch::epoch_of;
use crate::types::PowBlock;
use crate::utils::error::MinerError;
use ethereum_types::{H256, U256};
use std::sync::Arc;

/// Checks proof-of-work claims against light hashes
pub struct Verifier {
    context: Arc<PowContext>,
    strict_mix_digest: bool,
}

impl Verifier {
    /// Creates a verifier over the shared context
    pub fn new(context: Arc<PowContext>, config: &VerifierConfig) -> Self {
        Self {
            context,
            strict_mix_digest: config.strict_mix_digest,
        }
    }

    /// Verifies a sealed block
    ///
    /// A seed hash that is not the chain's seed hash for the block's epoch
    /// fails straight away, without hashing.
    ///
    /// # Returns
    /// * `Ok(true)` - the proof meets the block's target
    /// * `Ok(false)` - the proof is invalid
    /// * `Err(MinerError)` - a cache could not be built
    pub fn verify<B: PowBlock + ?Sized>(&self, block: &B) -> Result<bool, MinerError> {
        let number = block.number();
        let expected = self.context.chain().seed_hash_for_epoch(epoch_of(number));
        if block.seed_hash() != expected {
            log::debug!(
                "Block {} seed hash {:?} does not match epoch seed {:?}",
                number,
                block.seed_hash(),
                expected
            );
            return Ok(false);
        }

        self.verify_core(
            &block.hash_no_nonce(),
            &block.mix_digest(),
            block.difficulty(),
            number,
            block.nonce(),
        )
    }

    /// Verifies raw proof-of-work fields
    pub fn verify_core(
        &self,
        hash_no_nonce: &H256,
        mix_digest: &H256,
        difficulty: U256,
        height: u64,
        nonce: u64,
    ) -> Result<bool, MinerError> {
        if difficulty.is_zero() {
            log::warn!("Rejecting block {} with zero difficulty", height);
            return Ok(false);
        }
        let target = U256::MAX / difficulty;
        let epoch = epoch_of(height);
        let caches = self.context.caches();

        let historical = caches.current_epoch().is_some_and(|live| epoch < live);
        if historical {
            log::debug!("Verifying block {} with a standalone cache", height);
            let cache = caches.build_standalone(epoch)?;
            return Ok(self.check(&cache, hash_no_nonce, mix_digest, target, nonce));
        }

        let guard = caches.lock();
        let cache = guard.ensure_current(height)?;
        Ok(self.check(&cache, hash_no_nonce, mix_digest, target, nonce))
    }

    fn check(
        &self,
        cache: &Cache,
        hash_no_nonce: &H256,
        mix_digest: &H256,
        target: U256,
        nonce: u64,
    ) -> bool {
        let oracle = self.context.oracle();
        let (bytes, params) = (cache.bytes(), cache.params());

        let result = match oracle.light_hash_with_mix(bytes, params, hash_no_nonce, nonce) {
            Some((result, mix)) => {
                if self.strict_mix_digest && mix != *mix_digest {
                    log::debug!("Mix digest mismatch for nonce {}", nonce);
                    return false;
                }
                result
            }
            None => oracle.light_hash(bytes, params, hash_no_nonce, nonce),
        };

        U256::from_big_endian(result.as_bytes()) <= target
    }
}
