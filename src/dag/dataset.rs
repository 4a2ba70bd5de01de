// src/dag/dataset.rs
//! Full dataset (DAG) lifecycle
//!
//! The dataset is built from the cache of the same epoch, persisted to the
//! store right after computation and reused from the store across
//! restarts. Like the cache it is published through an `ArcSwapOption` and
//! replaced only under its lock, which in turn can only be taken while the
//! cache lock is held.

use crate::config::DagConfig;
use crate::dag::buffer::DagBuffer;
use crate::dag::cache::{Cache, CacheGuard, CacheManager};
use crate::dag::store::{DagStore, LoadOutcome, StoreError};
use crate::epoch::epoch_of;
use crate::oracle::{HashOracle, SizingParams};
use crate::utils::error::MinerError;
use arc_swap::ArcSwapOption;
use ethereum_types::H256;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Full dataset for one epoch
#[derive(Debug)]
pub struct Dataset {
    epoch: u64,
    params: SizingParams,
    buffer: DagBuffer,
}

impl Dataset {
    pub(crate) fn from_parts(epoch: u64, params: SizingParams, buffer: DagBuffer) -> Self {
        Self {
            epoch,
            params,
            buffer,
        }
    }

    /// Computes the dataset of the cache's epoch
    pub fn generate(oracle: &dyn HashOracle, cache: &Cache) -> Result<Self, MinerError> {
        let params = *cache.params();
        log::info!(
            "Generating DAG for epoch {} ({} bytes, takes a while)",
            cache.epoch(),
            params.dataset_size
        );
        let start = Instant::now();
        let buffer = DagBuffer::from_computation(params.dataset_size, |buf| {
            oracle.build_dataset(&params, cache.bytes(), buf)
        })?;
        log::info!("DAG for epoch {} took {:?}", cache.epoch(), start.elapsed());

        Ok(Self::from_parts(cache.epoch(), params, buffer))
    }

    /// Epoch id this dataset belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Sizing params of the dataset's epoch
    pub fn params(&self) -> &SizingParams {
        &self.params
    }

    /// Raw dataset bytes
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Live dataset and the epoch it was requested for
///
/// The two differ when a newer stored file was adopted.
#[derive(Debug)]
struct Served {
    target: u64,
    dataset: Arc<Dataset>,
}

/// Owns the live dataset, the dataset lock and the on-disk slot
pub struct DatasetManager {
    oracle: Arc<dyn HashOracle>,
    store: DagStore,
    persist: bool,
    verify_on_load: bool,
    load_probes: u64,
    lock: Mutex<()>,
    current: ArcSwapOption<Served>,
}

impl DatasetManager {
    /// Creates a manager with no dataset yet
    pub fn new(oracle: Arc<dyn HashOracle>, config: &DagConfig) -> Self {
        Self {
            oracle,
            store: DagStore::new(&config.path),
            persist: config.persist,
            verify_on_load: config.verify_on_load,
            load_probes: config.load_probes,
            lock: Mutex::new(()),
            current: ArcSwapOption::empty(),
        }
    }

    /// Takes the dataset lock
    ///
    /// The cache guard proves the cache lock is already held and keeps it
    /// held for as long as the returned guard lives.
    pub fn lock<'a>(&'a self, cache: &'a CacheGuard<'a>) -> DatasetGuard<'a> {
        DatasetGuard {
            manager: self,
            cache,
            _lock: self.lock.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Takes both locks in order and makes the dataset match `epoch_of(height)`
    pub fn ensure_current(
        &self,
        caches: &CacheManager,
        height: u64,
    ) -> Result<Arc<Dataset>, MinerError> {
        let cache = caches.lock();
        let guard = self.lock(&cache);
        guard.ensure_current(height)
    }

    /// Takes both locks in order and makes the dataset exactly `epoch_of(height)`
    pub fn ensure_exact(
        &self,
        caches: &CacheManager,
        height: u64,
    ) -> Result<Arc<Dataset>, MinerError> {
        let cache = caches.lock();
        let guard = self.lock(&cache);
        guard.ensure_exact(height)
    }

    /// Snapshot of the live dataset
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.current
            .load()
            .as_ref()
            .map(|served| Arc::clone(&served.dataset))
    }

    /// Epoch of the live dataset, without locking
    pub fn current_epoch(&self) -> Option<u64> {
        self.current.load().as_ref().map(|served| served.dataset.epoch)
    }

    /// The on-disk slot
    pub fn store(&self) -> &DagStore {
        &self.store
    }
}

/// Proof that both the cache and the dataset locks are held
pub struct DatasetGuard<'a> {
    manager: &'a DatasetManager,
    cache: &'a CacheGuard<'a>,
    _lock: MutexGuard<'a, ()>,
}

impl DatasetGuard<'_> {
    /// Makes the live dataset match `epoch_of(height)`
    ///
    /// Reuses the stored dataset when its header epoch is at least the
    /// target, otherwise regenerates from the cache and persists. The old
    /// dataset is released before the new one is loaded or built. A newer
    /// dataset adopted for a target keeps serving that target without
    /// touching the store again.
    ///
    /// # Errors
    /// - `AllocationError` if a buffer cannot be allocated
    /// - `StorageError` if persisting hit a fatal error; the new dataset is
    ///   live regardless
    pub fn ensure_current(&self, height: u64) -> Result<Arc<Dataset>, MinerError> {
        self.ensure(epoch_of(height), false)
    }

    /// Like [`ensure_current`](Self::ensure_current), but only ever serves
    /// the dataset of `epoch_of(height)` itself
    ///
    /// A stored file for a newer epoch is skipped and the target's dataset
    /// is regenerated, overwriting the slot. Hashes that must verify at
    /// `height` are computed over this dataset.
    pub fn ensure_exact(&self, height: u64) -> Result<Arc<Dataset>, MinerError> {
        self.ensure(epoch_of(height), true)
    }

    fn ensure(&self, target: u64, exact: bool) -> Result<Arc<Dataset>, MinerError> {
        if let Some(served) = self.manager.current.load_full() {
            if served.dataset.epoch == target || (!exact && served.target == target) {
                return Ok(Arc::clone(&served.dataset));
            }
        }
        self.release();

        let start = Instant::now();
        let (dataset, persisted) = match self.load(target, exact)? {
            Some(dataset) => (dataset, Ok(())),
            None => self.regenerate(target)?,
        };
        let dataset = Arc::new(dataset);
        self.manager.current.store(Some(Arc::new(Served {
            target,
            dataset: Arc::clone(&dataset),
        })));
        log::info!(
            "DAG for epoch {} ready after {:?}",
            dataset.epoch,
            start.elapsed()
        );

        persisted?;
        Ok(dataset)
    }

    /// The live dataset
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.manager.current()
    }

    /// Drops the live dataset
    pub fn release(&self) {
        self.manager.current.store(None);
    }

    fn load(&self, target: u64, exact: bool) -> Result<Option<Dataset>, MinerError> {
        let manager = self.manager;
        let path = manager.store.path().display();

        if exact {
            if let Ok(stored) = manager.store.read_header() {
                if stored > target {
                    log::warn!(
                        "DAG in {} is for newer epoch {}, hashing needs {}. Regenerating...",
                        path,
                        stored,
                        target
                    );
                    return Ok(None);
                }
            }
        }

        match manager.store.load(manager.oracle.as_ref(), target)? {
            LoadOutcome::Loaded(dataset) => {
                if manager.verify_on_load && !self.probe(&dataset, target)? {
                    log::warn!(
                        "DAG at {} does not match its epoch {}. Regenerating...",
                        path,
                        dataset.epoch
                    );
                    return Ok(None);
                }
                log::info!("Loaded DAG for epoch {} from {}", dataset.epoch, path);
                Ok(Some(dataset))
            }
            LoadOutcome::Missing => {
                log::info!("No DAG found in {}. Generating new DAG...", path);
                Ok(None)
            }
            LoadOutcome::Stale { stored } => {
                log::info!(
                    "DAG in {} is for epoch {}, need {}. Generating new DAG...",
                    path,
                    stored,
                    target
                );
                Ok(None)
            }
            LoadOutcome::Invalid(reason) => {
                log::warn!("Ignoring DAG in {}: {}", path, reason);
                Ok(None)
            }
        }
    }

    /// Spot-checks a loaded dataset against light hashes of its own epoch
    fn probe(&self, dataset: &Dataset, target: u64) -> Result<bool, MinerError> {
        let cache = if dataset.epoch == target {
            self.cache.ensure_epoch(target)?
        } else {
            Arc::new(self.cache.standalone(dataset.epoch)?)
        };

        let oracle = self.manager.oracle.as_ref();
        for nonce in 0..self.manager.load_probes {
            let header = H256::repeat_byte(nonce as u8);
            let (full, _) = oracle.full_hash(dataset.bytes(), dataset.params(), &header, nonce);
            let light = oracle.light_hash(cache.bytes(), cache.params(), &header, nonce);
            if full != light {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn regenerate(&self, target: u64) -> Result<(Dataset, Result<(), StoreError>), MinerError> {
        let manager = self.manager;
        let cache = self.cache.ensure_epoch(target)?;
        let dataset = Dataset::generate(manager.oracle.as_ref(), &cache)?;

        if !manager.persist {
            return Ok((dataset, Ok(())));
        }
        let persisted = match manager.store.persist(&dataset) {
            Ok(()) => {
                log::info!("Wrote DAG for epoch {} to {}", target, manager.store.path().display());
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                log::error!("{}", e);
                Err(e)
            }
            Err(e) => {
                log::warn!("{}; continuing with in-memory DAG", e);
                Ok(())
            }
        };
        Ok((dataset, persisted))
    }
}
