// src/engine.rs
//! Public proof-of-work facade
//!
//! [`PowEngine`] wires one [`PowContext`] to a [`MiningCoordinator`] and a
//! [`Verifier`] and exposes the operations callers need: search, verify,
//! hash-rate and turbo control, size and seed queries, raw full and light
//! hashes, DAG pre-generation and shutdown.

use crate::chain::ChainReader;
use crate::config::Config;
use crate::context::PowContext;
use crate::dag::Dataset;
use crate::epoch::epoch_of;
use crate::miner::{CancelSignal, MiningCoordinator, NonceSource, nonce};
use crate::oracle::{HashOracle, SizingParams};
use crate::stats::HashRate;
use crate::types::{PowBlock, SearchOutcome};
use crate::utils::error::MinerError;
use crate::verifier::Verifier;
use ethereum_types::H256;
use std::sync::Arc;

/// Miner and verifier over one shared cache/dataset pair
pub struct PowEngine {
    context: Arc<PowContext>,
    miner: MiningCoordinator,
    verifier: Verifier,
}

impl PowEngine {
    /// Creates an engine and builds the cache for the chain's current epoch
    ///
    /// The start-nonce source follows `miner.nonce_seed`.
    pub fn new(
        oracle: Arc<dyn HashOracle>,
        chain: Arc<dyn ChainReader>,
        config: &Config,
    ) -> Result<Self, MinerError> {
        Self::with_nonce_source(oracle, chain, config, nonce::from_config(&config.miner))
    }

    /// Same as [`PowEngine::new`] with an explicit start-nonce source
    pub fn with_nonce_source(
        oracle: Arc<dyn HashOracle>,
        chain: Arc<dyn ChainReader>,
        config: &Config,
        nonces: Box<dyn NonceSource>,
    ) -> Result<Self, MinerError> {
        let context = Arc::new(PowContext::new(oracle, chain, &config.dag));
        let height = context.chain().current_height();
        context.caches().ensure_current(height)?;

        Ok(Self {
            miner: MiningCoordinator::new(Arc::clone(&context), nonces, &config.miner),
            verifier: Verifier::new(Arc::clone(&context), &config.verifier),
            context,
        })
    }

    /// Searches for a nonce meeting the block's target until found or cancelled
    pub fn search<B, C>(&self, block: &B, cancel: &C) -> Result<SearchOutcome, MinerError>
    where
        B: PowBlock + ?Sized,
        C: CancelSignal + ?Sized,
    {
        self.miner.search(block, cancel)
    }

    /// Checks a sealed block's proof of work
    pub fn verify<B: PowBlock + ?Sized>(&self, block: &B) -> Result<bool, MinerError> {
        self.verifier.verify(block)
    }

    /// Hashes per second of the running (or last) search; 0 after a cancel
    pub fn hash_rate(&self) -> u64 {
        self.miner.hash_rate().get()
    }

    /// Handle on the live hash-rate meter, for reporters
    pub fn hash_rate_meter(&self) -> HashRate {
        self.miner.hash_rate().clone()
    }

    /// Enables or disables the per-attempt throttle
    pub fn set_turbo(&self, on: bool) {
        self.miner.set_turbo(on);
    }

    /// Dataset size of the live cache's epoch, or 0 after [`PowEngine::stop`]
    pub fn dataset_size(&self) -> usize {
        self.live_params().map_or(0, |params| params.dataset_size)
    }

    /// Cache size of the live cache's epoch, or 0 after [`PowEngine::stop`]
    pub fn cache_size(&self) -> usize {
        self.live_params().map_or(0, |params| params.cache_size)
    }

    /// Canonical seed hash for the epoch of `height`
    pub fn seed_hash(&self, height: u64) -> H256 {
        self.context.chain().seed_hash_for_epoch(epoch_of(height))
    }

    /// Full hash of one nonce at the chain's current height
    ///
    /// Brings the dataset up to date first and hashes under both locks.
    ///
    /// # Returns
    /// `(result, mix_digest)`
    pub fn full_hash(&self, nonce: u64, header_hash: &H256) -> Result<(H256, H256), MinerError> {
        let height = self.context.chain().current_height();
        let cache = self.context.caches().lock();
        let datasets = self.context.datasets().lock(&cache);
        let dataset = datasets.ensure_exact(height)?;
        Ok(self
            .context
            .oracle()
            .full_hash(dataset.bytes(), dataset.params(), header_hash, nonce))
    }

    /// Light hash of one nonce at the chain's current height
    pub fn light_hash(&self, nonce: u64, header_hash: &H256) -> Result<H256, MinerError> {
        let height = self.context.chain().current_height();
        let guard = self.context.caches().lock();
        let cache = guard.ensure_current(height)?;
        Ok(self
            .context
            .oracle()
            .light_hash(cache.bytes(), cache.params(), header_hash, nonce))
    }

    /// Loads or generates the DAG for the chain's current height ahead of mining
    pub fn ensure_dataset(&self) -> Result<Arc<Dataset>, MinerError> {
        let height = self.context.chain().current_height();
        self.context
            .datasets()
            .ensure_exact(self.context.caches(), height)
    }

    /// Releases the cache and the dataset
    ///
    /// Waits for a running search to finish first. Later calls rebuild
    /// whatever they need.
    pub fn stop(&self) {
        self.context.release();
    }

    /// The shared context
    pub fn context(&self) -> &Arc<PowContext> {
        &self.context
    }

    fn live_params(&self) -> Option<SizingParams> {
        self.context.caches().current().map(|cache| *cache.params())
    }
}
