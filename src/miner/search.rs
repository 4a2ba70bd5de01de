// src/miner/search.rs
//! Nonce search over the full dataset
//!
//! A search holds the cache lock and the dataset lock from the moment it
//! starts until it returns, so only one search runs per context and the
//! dataset cannot be swapped out underneath it.

use crate::config::MinerConfig;
use crate::context::PowContext;
use crate::epoch::epoch_of;
use crate::miner::cancel::CancelSignal;
use crate::miner::nonce::NonceSource;
use crate::stats::HashRate;
use crate::types::{PowBlock, SearchOutcome, Solution, target_for};
use crate::utils::error::MinerError;
use ethereum_types::U256;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Runs nonce searches against the shared context
pub struct MiningCoordinator {
    /// Shared managers and collaborators
    context: Arc<PowContext>,
    /// Where each search starts
    nonces: Box<dyn NonceSource>,
    /// Live hash rate, published after every attempt
    hash_rate: HashRate,
    /// Skip the per-attempt sleep when set
    turbo: AtomicBool,
    /// Per-attempt sleep when turbo is off
    throttle: Duration,
}

impl MiningCoordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    /// * `context` - Shared cache/dataset state
    /// * `nonces` - Start-nonce source
    /// * `config` - Turbo flag and throttle
    pub fn new(
        context: Arc<PowContext>,
        nonces: Box<dyn NonceSource>,
        config: &MinerConfig,
    ) -> Self {
        MiningCoordinator {
            context,
            nonces,
            hash_rate: HashRate::new(),
            turbo: AtomicBool::new(config.turbo),
            throttle: config.throttle(),
        }
    }

    /// Searches for a nonce whose full hash meets the block's target
    ///
    /// Makes the dataset current for the block's height first, which may
    /// load or generate a DAG.
    ///
    /// # Returns
    /// * `Ok(SearchOutcome::Found)` - nonce, mix digest and seed hash to seal
    /// * `Ok(SearchOutcome::Cancelled)` - `cancel` fired first
    /// * `Err(MinerError)` - zero difficulty or a DAG resource failure
    pub fn search<B, C>(&self, block: &B, cancel: &C) -> Result<SearchOutcome, MinerError>
    where
        B: PowBlock + ?Sized,
        C: CancelSignal + ?Sized,
    {
        let target = target_for(block.difficulty())?;

        let cache = self.context.caches().lock();
        let datasets = self.context.datasets().lock(&cache);
        let dataset = datasets.ensure_exact(block.number())?;

        let seed_hash = self
            .context
            .chain()
            .seed_hash_for_epoch(epoch_of(block.number()));
        let header = block.hash_no_nonce();
        let oracle = self.context.oracle();

        let mut nonce = self.nonces.start_nonce();
        let mut attempts = 0u64;
        self.hash_rate.begin();
        let start = Instant::now();
        log::debug!(
            "Searching block {} from nonce {} (target {:#x})",
            block.number(),
            nonce,
            target
        );

        loop {
            if cancel.is_cancelled() {
                self.hash_rate.reset();
                log::info!("Nonce search aborted after {} attempts", attempts);
                return Ok(SearchOutcome::Cancelled);
            }

            let (result, mix_digest) =
                oracle.full_hash(dataset.bytes(), dataset.params(), &header, nonce);
            attempts += 1;
            self.hash_rate.record(attempts, start.elapsed());

            if U256::from_big_endian(result.as_bytes()) <= target {
                log::info!(
                    "Nonce found for block {}: {} after {} attempts",
                    block.number(),
                    nonce,
                    attempts
                );
                return Ok(SearchOutcome::Found(Solution {
                    nonce,
                    mix_digest,
                    seed_hash,
                }));
            }
            nonce = nonce.wrapping_add(1);

            if !self.turbo.load(Ordering::Relaxed) {
                thread::sleep(self.throttle);
            }
        }
    }

    /// The live hash rate
    pub fn hash_rate(&self) -> &HashRate {
        &self.hash_rate
    }

    /// Enables or disables turbo mode; takes effect on the next attempt
    pub fn set_turbo(&self, on: bool) {
        self.turbo.store(on, Ordering::Relaxed);
    }

    /// Whether turbo mode is on
    pub fn turbo(&self) -> bool {
        self.turbo.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainReader, LocalChain};
    use crate::config::DagConfig;
    use crate::miner::cancel::Never;
    use crate::miner::nonce::FixedNonce;
    use crate::oracle::HashOracle;
    use crate::oracle::testing::CountingOracle;
    use crate::types::Header;
    use crossbeam_channel::bounded;
    use ethereum_types::H256;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        oracle: Arc<CountingOracle>,
        context: Arc<PowContext>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let dag = DagConfig {
            path: dir.path().join("dag"),
            ..DagConfig::default()
        };
        let oracle = Arc::new(CountingOracle::default());
        let context = Arc::new(PowContext::new(
            oracle.clone(),
            Arc::new(LocalChain::default()),
            &dag,
        ));
        Fixture {
            _dir: dir,
            oracle,
            context,
        }
    }

    fn coordinator(fx: &Fixture, start: u64) -> MiningCoordinator {
        MiningCoordinator::new(
            fx.context.clone(),
            Box::new(FixedNonce(start)),
            &MinerConfig::default(),
        )
    }

    fn block(number: u64, difficulty: u64) -> Header {
        Header {
            number,
            difficulty: U256::from(difficulty),
            hash_no_nonce: H256::repeat_byte(0xab),
            ..Header::default()
        }
    }

    #[test]
    fn test_difficulty_one_finds_first_nonce() {
        let fx = fixture();
        let miner = coordinator(&fx, 99);

        let outcome = miner.search(&block(1, 1), &Never).unwrap();
        let SearchOutcome::Found(solution) = outcome else {
            panic!("expected a solution, got {:?}", outcome);
        };
        assert_eq!(solution.nonce, 99);
        assert_eq!(fx.oracle.full_hashes(), 1);
        assert_eq!(solution.seed_hash, LocalChain::default().seed_hash_for_epoch(0));
    }

    #[test]
    fn test_found_result_meets_target() {
        let fx = fixture();
        let miner = coordinator(&fx, 0);
        let header = block(30_001, 16);

        let SearchOutcome::Found(solution) = miner.search(&header, &Never).unwrap() else {
            panic!("search was not expected to cancel");
        };
        let dataset = fx.context.datasets().current().unwrap();
        let (result, mix) = fx.oracle.full_hash(
            dataset.bytes(),
            dataset.params(),
            &header.hash_no_nonce,
            solution.nonce,
        );
        assert_eq!(mix, solution.mix_digest);
        assert!(U256::from_big_endian(result.as_bytes()) <= target_for(header.difficulty).unwrap());
        assert_eq!(dataset.epoch(), 30_000);
    }

    #[test]
    fn test_nonce_wraps_around() {
        let fx = fixture();
        let miner = coordinator(&fx, u64::MAX);
        let SearchOutcome::Found(solution) = miner.search(&block(1, 4), &Never).unwrap() else {
            panic!("search was not expected to cancel");
        };
        let attempts = fx.oracle.full_hashes() as u64;
        assert_eq!(solution.nonce, u64::MAX.wrapping_add(attempts - 1));
    }

    #[test]
    fn test_zero_difficulty_is_rejected() {
        let fx = fixture();
        let miner = coordinator(&fx, 0);
        let err = miner.search(&block(1, 0), &Never).unwrap_err();
        assert!(matches!(err, MinerError::InputError(_)));
        assert_eq!(fx.oracle.dataset_builds(), 0);
    }

    #[test]
    fn test_cancel_before_first_attempt() {
        let fx = fixture();
        let miner = coordinator(&fx, 0);
        let (tx, rx) = bounded::<()>(1);
        tx.send(()).unwrap();

        assert_eq!(miner.search(&block(1, 1), &rx).unwrap(), SearchOutcome::Cancelled);
        assert_eq!(fx.oracle.full_hashes(), 0);
        assert_eq!(miner.hash_rate().get(), 0);
    }

    #[test]
    fn test_cancel_from_another_thread_resets_rate() {
        let fx = fixture();
        let miner = Arc::new(coordinator(&fx, 0));
        let (tx, rx) = bounded::<()>(1);

        let handle = {
            let miner = Arc::clone(&miner);
            thread::spawn(move || miner.search(&block(1, u64::MAX), &rx))
        };
        thread::sleep(Duration::from_millis(50));
        drop(tx);

        assert_eq!(handle.join().unwrap().unwrap(), SearchOutcome::Cancelled);
        assert_eq!(miner.hash_rate().get(), 0);
        assert!(miner.hash_rate().total() > 0);
    }

    #[test]
    fn test_turbo_does_not_change_result() {
        let fx = fixture();
        let miner = coordinator(&fx, 5);
        let header = block(1, 8);

        let fast = miner.search(&header, &Never).unwrap();
        miner.set_turbo(false);
        assert!(!miner.turbo());
        let slow = miner.search(&header, &Never).unwrap();
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_total_counts_only_the_latest_search() {
        let fx = fixture();
        let miner = coordinator(&fx, 0);

        miner.search(&block(1, 64), &Never).unwrap();
        let first = fx.oracle.full_hashes() as u64;
        assert_eq!(miner.hash_rate().total(), first);

        miner.search(&block(1, 4), &Never).unwrap();
        let second = fx.oracle.full_hashes() as u64 - first;
        assert_eq!(miner.hash_rate().total(), second);
    }

    #[test]
    fn test_newer_stored_dag_is_not_mined_against() {
        let fx = fixture();
        let ahead = coordinator(&fx, 0);
        ahead.search(&block(60_001, 1), &Never).unwrap();
        fx.context.release();
        let builds = fx.oracle.dataset_builds();

        let miner = coordinator(&fx, 0);
        let header = block(30_001, 16);
        let SearchOutcome::Found(solution) = miner.search(&header, &Never).unwrap() else {
            panic!("search was not expected to cancel");
        };
        let dataset = fx.context.datasets().current().unwrap();
        assert_eq!(dataset.epoch(), 30_000);
        assert_eq!(fx.oracle.dataset_builds(), builds + 1);

        let cache = fx.context.caches().build_standalone(30_000).unwrap();
        let light = fx.oracle.light_hash(
            cache.bytes(),
            cache.params(),
            &header.hash_no_nonce,
            solution.nonce,
        );
        assert!(U256::from_big_endian(light.as_bytes()) <= target_for(header.difficulty).unwrap());
    }
}
