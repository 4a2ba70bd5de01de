// src/dag/cache.rs
//! Light cache lifecycle
//!
//! One cache is live per process. It is rebuilt, never mutated, when the
//! required epoch changes, and published through an `ArcSwapOption` so
//! readers always see a complete cache. Replacement happens only while the
//! cache lock is held.

use crate::chain::ChainReader;
use crate::dag::buffer::DagBuffer;
use crate::epoch::epoch_of;
use crate::oracle::{HashOracle, SizingParams};
use crate::utils::error::MinerError;
use arc_swap::ArcSwapOption;
use ethereum_types::H256;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Seed-derived cache for one epoch
#[derive(Debug)]
pub struct Cache {
    epoch: u64,
    params: SizingParams,
    seed_hash: H256,
    buffer: DagBuffer,
}

impl Cache {
    /// Builds the cache for `epoch` using the chain's seed hash
    pub fn build(
        oracle: &dyn HashOracle,
        chain: &dyn ChainReader,
        epoch: u64,
    ) -> Result<Self, MinerError> {
        let params = oracle.sizing_params(epoch);
        let seed_hash = chain.seed_hash_for_epoch(epoch);

        log::info!(
            "Making cache for epoch {} ({} bytes)",
            epoch,
            params.cache_size
        );
        let start = Instant::now();
        let buffer = DagBuffer::from_computation(params.cache_size, |buf| {
            oracle.build_cache(&params, &seed_hash, buf)
        })?;
        log::info!("Cache for epoch {} took {:?}", epoch, start.elapsed());

        Ok(Self {
            epoch,
            params,
            seed_hash,
            buffer,
        })
    }

    /// Epoch id this cache belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Sizing params of the cache's epoch
    pub fn params(&self) -> &SizingParams {
        &self.params
    }

    /// Seed hash the cache was built from
    pub fn seed_hash(&self) -> H256 {
        self.seed_hash
    }

    /// Raw cache bytes
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Owns the live cache and the cache lock
pub struct CacheManager {
    oracle: Arc<dyn HashOracle>,
    chain: Arc<dyn ChainReader>,
    lock: Mutex<()>,
    current: ArcSwapOption<Cache>,
}

impl CacheManager {
    /// Creates a manager with no cache yet
    pub fn new(oracle: Arc<dyn HashOracle>, chain: Arc<dyn ChainReader>) -> Self {
        Self {
            oracle,
            chain,
            lock: Mutex::new(()),
            current: ArcSwapOption::empty(),
        }
    }

    /// Takes the cache lock
    ///
    /// Must be taken before the dataset lock whenever both are needed.
    pub fn lock(&self) -> CacheGuard<'_> {
        CacheGuard {
            manager: self,
            _lock: self.lock.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Makes the live cache match `epoch_of(height)`, rebuilding if needed
    pub fn ensure_current(&self, height: u64) -> Result<Arc<Cache>, MinerError> {
        self.lock().ensure_current(height)
    }

    /// Builds a throwaway cache for any epoch
    ///
    /// Takes no lock and leaves the live cache untouched, so verifying old
    /// blocks never stalls or disturbs mining.
    pub fn build_standalone(&self, epoch: u64) -> Result<Cache, MinerError> {
        Cache::build(self.oracle.as_ref(), self.chain.as_ref(), epoch)
    }

    /// Snapshot of the live cache
    pub fn current(&self) -> Option<Arc<Cache>> {
        self.current.load_full()
    }

    /// Epoch of the live cache, without locking
    pub fn current_epoch(&self) -> Option<u64> {
        self.current.load().as_ref().map(|cache| cache.epoch)
    }
}

/// Proof that the cache lock is held
pub struct CacheGuard<'a> {
    manager: &'a CacheManager,
    _lock: MutexGuard<'a, ()>,
}

impl CacheGuard<'_> {
    /// Makes the live cache match `epoch_of(height)`
    pub fn ensure_current(&self, height: u64) -> Result<Arc<Cache>, MinerError> {
        self.ensure_epoch(epoch_of(height))
    }

    /// Makes the live cache match `epoch`
    ///
    /// A no-op returning the live cache when the epoch is unchanged.
    pub fn ensure_epoch(&self, epoch: u64) -> Result<Arc<Cache>, MinerError> {
        if let Some(cache) = self.manager.current.load_full() {
            if cache.epoch == epoch {
                log::debug!("Cache for epoch {} is current", epoch);
                return Ok(cache);
            }
        }

        let cache = Arc::new(self.manager.build_standalone(epoch)?);
        self.manager.current.store(Some(Arc::clone(&cache)));
        Ok(cache)
    }

    /// Builds a cache for another epoch without replacing the live one
    pub fn standalone(&self, epoch: u64) -> Result<Cache, MinerError> {
        self.manager.build_standalone(epoch)
    }

    /// The live cache
    pub fn current(&self) -> Option<Arc<Cache>> {
        self.manager.current()
    }

    /// Drops the live cache
    pub fn release(&self) {
        self.manager.current.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::LocalChain;
    use crate::epoch::EPOCH_LENGTH;
    use crate::oracle::testing::CountingOracle;

    fn manager() -> (Arc<CountingOracle>, CacheManager) {
        let oracle = Arc::new(CountingOracle::default());
        let chain = Arc::new(LocalChain::new(0));
        (oracle.clone(), CacheManager::new(oracle, chain))
    }

    #[test]
    fn test_ensure_current_is_idempotent() {
        let (oracle, caches) = manager();
        let first = caches.ensure_current(10).unwrap();
        let second = caches.ensure_current(20).unwrap();

        assert_eq!(oracle.cache_builds(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.epoch(), 0);
    }

    #[test]
    fn test_epoch_change_rebuilds() {
        let (oracle, caches) = manager();
        let old = caches.ensure_current(30_000).unwrap();
        let new = caches.ensure_current(30_001).unwrap();

        assert_eq!(oracle.cache_builds(), 2);
        assert_eq!(new.epoch(), EPOCH_LENGTH);
        assert_eq!(new.bytes().len(), new.params().cache_size);
        assert_ne!(old.bytes().len(), new.bytes().len());
        assert_eq!(caches.current_epoch(), Some(EPOCH_LENGTH));
    }

    #[test]
    fn test_cache_uses_chain_seed_hash() {
        let (_, caches) = manager();
        let cache = caches.ensure_current(60_001).unwrap();
        let chain = LocalChain::default();
        assert_eq!(cache.seed_hash(), chain.seed_hash_for_epoch(60_000));
    }

    #[test]
    fn test_standalone_does_not_touch_live_cache() {
        let (oracle, caches) = manager();
        let live = caches.ensure_current(60_001).unwrap();
        let old = caches.build_standalone(0).unwrap();

        assert_eq!(old.epoch(), 0);
        assert_eq!(oracle.cache_builds(), 2);
        assert!(Arc::ptr_eq(&live, &caches.current().unwrap()));
        assert_eq!(caches.current_epoch(), Some(60_000));
    }

    #[test]
    fn test_release_drops_cache() {
        let (_, caches) = manager();
        caches.ensure_current(1).unwrap();
        caches.lock().release();
        assert!(caches.current().is_none());
        assert_eq!(caches.current_epoch(), None);
    }
}
