// src/context.rs
//! Shared proof-of-work state
//!
//! A [`PowContext`] owns both managers, and with them both locks and both
//! live buffers. The miner, the verifier and the engine share one context
//! through an `Arc`.

use crate::chain::ChainReader;
use crate::config::DagConfig;
use crate::dag::{CacheManager, DatasetManager};
use crate::oracle::HashOracle;
use std::sync::Arc;

/// Cache and dataset managers plus the collaborators they build from
pub struct PowContext {
    oracle: Arc<dyn HashOracle>,
    chain: Arc<dyn ChainReader>,
    caches: CacheManager,
    datasets: DatasetManager,
}

impl PowContext {
    /// Creates a context with no cache or dataset built yet
    ///
    /// # Arguments
    /// * `oracle` - Hash function used for every build and hash
    /// * `chain` - Source of heights and seed hashes
    /// * `dag` - Dataset file location and load/persist policy
    pub fn new(oracle: Arc<dyn HashOracle>, chain: Arc<dyn ChainReader>, dag: &DagConfig) -> Self {
        Self {
            caches: CacheManager::new(Arc::clone(&oracle), Arc::clone(&chain)),
            datasets: DatasetManager::new(Arc::clone(&oracle), dag),
            oracle,
            chain,
        }
    }

    /// The hash oracle
    pub fn oracle(&self) -> &dyn HashOracle {
        self.oracle.as_ref()
    }

    /// The chain collaborator
    pub fn chain(&self) -> &dyn ChainReader {
        self.chain.as_ref()
    }

    /// The cache manager
    pub fn caches(&self) -> &CacheManager {
        &self.caches
    }

    /// The dataset manager
    pub fn datasets(&self) -> &DatasetManager {
        &self.datasets
    }

    /// Drops both live buffers, taking the locks cache first
    pub fn release(&self) {
        let cache = self.caches.lock();
        let dataset = self.datasets.lock(&cache);
        dataset.release();
        cache.release();
        log::info!("Released cache and DAG");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::LocalChain;
    use crate::oracle::testing::CountingOracle;

    #[test]
    fn test_release_drops_both_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let dag = DagConfig {
            path: dir.path().join("dag"),
            ..DagConfig::default()
        };
        let ctx = PowContext::new(
            Arc::new(CountingOracle::default()),
            Arc::new(LocalChain::new(1)),
            &dag,
        );

        ctx.datasets().ensure_current(ctx.caches(), 1).unwrap();
        assert!(ctx.caches().current().is_some());
        assert!(ctx.datasets().current().is_some());

        ctx.release();
        assert!(ctx.caches().current().is_none());
        assert!(ctx.datasets().current().is_none());
    }
}
