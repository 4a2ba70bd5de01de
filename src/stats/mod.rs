//! Statistics collection and reporting module
//!
//! - [`HashRate`]: the live hash rate published by the search loop
//! - [`StatsReporter`]: periodic log lines with hash rate, CPU and memory

/// Hash rate meter shared between the miner and its readers
pub mod hashrate;

/// Submodule containing the statistics reporter implementation
pub mod reporter;

// Re-export main components
pub use hashrate::HashRate;
pub use reporter::{HardwareStats, StatsReporter};
