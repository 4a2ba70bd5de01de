// src/dag/buffer.rs
//! Owned byte buffer backing caches and datasets
//!
//! A `DagBuffer` has exactly one owner and is never cloned. It can be filled
//! by a computation or read from storage; once built the two are
//! indistinguishable.

use crate::utils::error::MinerError;
use std::fmt;
use std::io::{self, Read};
use std::ops::Deref;

/// Move-only byte buffer for cache and dataset contents
pub struct DagBuffer {
    bytes: Vec<u8>,
}

impl DagBuffer {
    /// Allocates `len` zeroed bytes and lets `fill` compute the contents
    ///
    /// # Errors
    /// `AllocationError` if the memory cannot be reserved.
    pub fn from_computation<F>(len: usize, fill: F) -> Result<Self, MinerError>
    where
        F: FnOnce(&mut [u8]),
    {
        let mut bytes = reserve(len)?;
        bytes.resize(len, 0);
        fill(&mut bytes);
        Ok(Self { bytes })
    }

    /// Reads exactly `len` bytes from `reader`
    ///
    /// # Errors
    /// - `AllocationError` if the memory cannot be reserved
    /// - `IoError` if the reader fails or ends early
    pub fn from_storage<R: Read>(reader: R, len: usize) -> Result<Self, MinerError> {
        let mut bytes = reserve(len)?;
        reader.take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, read {}", len, bytes.len()),
            )
            .into());
        }
        Ok(Self { bytes })
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn reserve(len: usize) -> Result<Vec<u8>, MinerError> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| MinerError::AllocationError(len))?;
    Ok(bytes)
}

impl Deref for DagBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for DagBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for DagBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DagBuffer").field("len", &self.bytes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_computation_fills_exact_length() {
        let buf = DagBuffer::from_computation(16, |b| {
            for (i, byte) in b.iter_mut().enumerate() {
                *byte = i as u8;
            }
        })
        .unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(buf[15], 15);
    }

    #[test]
    fn test_from_storage_reads_only_len_bytes() {
        let buf = DagBuffer::from_storage(Cursor::new(vec![7u8; 32]), 8).unwrap();
        assert_eq!(&buf[..], &[7u8; 8]);
    }

    #[test]
    fn test_from_storage_short_read() {
        let err = DagBuffer::from_storage(Cursor::new(vec![1u8; 4]), 8).unwrap_err();
        match err {
            MinerError::IoError(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_origin_is_invisible() {
        let computed = DagBuffer::from_computation(4, |b| b.copy_from_slice(&[1, 2, 3, 4])).unwrap();
        let stored = DagBuffer::from_storage(Cursor::new([1u8, 2, 3, 4]), 4).unwrap();
        assert_eq!(&computed[..], &stored[..]);
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let err = DagBuffer::from_computation(usize::MAX, |_| {}).unwrap_err();
        assert!(matches!(err, MinerError::AllocationError(n) if n == usize::MAX));
    }
}
