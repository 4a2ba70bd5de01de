// src/epoch.rs
//! Block height to epoch mapping
//!
//! An epoch is identified by its boundary block height, not by its ordinal.
//! Heights `0..=EPOCH_LENGTH` belong to epoch `0`; from then on the first
//! height of epoch `N` is `N + 1`.

/// Number of blocks sharing one cache/dataset pair
pub const EPOCH_LENGTH: u64 = 30_000;

/// Returns the epoch id (boundary height) for a block height
pub fn epoch_of(height: u64) -> u64 {
    if height <= EPOCH_LENGTH {
        0
    } else {
        ((height - 1) / EPOCH_LENGTH) * EPOCH_LENGTH
    }
}

/// Ordinal of an epoch id, as used for sizing and seed derivation
pub fn epoch_number(epoch: u64) -> u64 {
    epoch / EPOCH_LENGTH
}
