// src/stats/hashrate.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live hash rate published by the search loop
///
/// Cheap to clone; all clones observe the same counters.
#[derive(Debug, Clone, Default)]
pub struct HashRate {
    inner: Arc<Meter>,
}

#[derive(Debug, Default)]
struct Meter {
    rate: AtomicU64,
    total: AtomicU64,
}

impl HashRate {
    /// Creates a meter reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempt and republishes the rate
    ///
    /// # Arguments
    /// * `attempts` - Attempts made by the current search so far
    /// * `elapsed` - Time since the current search started
    pub fn record(&self, attempts: u64, elapsed: Duration) {
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            let rate = (attempts as f64 / secs) as u64;
            self.inner.rate.store(rate, Ordering::Relaxed);
        }
    }

    /// Hashes per second of the current (or last) search
    pub fn get(&self) -> u64 {
        self.inner.rate.load(Ordering::Relaxed)
    }

    /// Hashes attempted by the current (or last) search
    ///
    /// Counts from the latest [`begin`](Self::begin); cancelling keeps it.
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Zeroes both counters at the start of a search
    pub fn begin(&self) {
        self.inner.rate.store(0, Ordering::Relaxed);
        self.inner.total.store(0, Ordering::Relaxed);
    }

    /// Sets the rate back to zero
    pub fn reset(&self) {
        self.inner.rate.store(0, Ordering::Relaxed);
    }
}
