// src/dag/mod.rs
//! Epoch-scoped cache and dataset management
//!
//! - [`cache`]: the light cache, rebuilt on epoch change
//! - [`dataset`]: the full DAG, built from the cache or loaded from disk
//! - [`store`]: the single on-disk dataset slot
//! - [`buffer`]: the owned byte buffer behind both
//!
//! Lock order is always cache, then dataset.

/// Owned byte buffer
pub mod buffer;

/// Light cache and its manager
pub mod cache;

/// Full dataset and its manager
pub mod dataset;

/// Dataset persistence
pub mod store;

pub use self::buffer::DagBuffer;
pub use self::cache::{Cache, CacheGuard, CacheManager};
pub use self::dataset::{Dataset, DatasetGuard, DatasetManager};
pub use self::store::{DagStore, LoadOutcome, StoreError};
