// src/dag/store.rs
//! On-disk dataset slot
//!
//! A single file holds the most recent dataset: an 8-byte big-endian epoch
//! id followed by exactly `dataset_size` raw bytes. Writes go to a sibling
//! temp file that is renamed into place, so the slot never holds a
//! half-written dataset.

use crate::dag::buffer::DagBuffer;
use crate::dag::dataset::Dataset;
use crate::oracle::HashOracle;
use crate::utils::error::MinerError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Length of the epoch header in bytes
pub const HEADER_LEN: u64 = 8;

/// Failure to persist a dataset
#[derive(Error, Debug)]
pub enum StoreError {
    /// The dataset stays usable in memory; only persistence is skipped
    #[error("could not persist DAG to {}: {source}", .path.display())]
    Recoverable {
        /// Slot path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The disk cannot take the dataset
    #[error("no space left persisting DAG to {}: {source}", .path.display())]
    Fatal {
        /// Slot path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

impl StoreError {
    /// Sorts an I/O failure into recoverable or fatal
    pub fn classify(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::StorageFull => StoreError::Fatal { path, source },
            _ => StoreError::Recoverable { path, source },
        }
    }

    /// Whether the caller must be told
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Fatal { .. })
    }
}

/// What the slot held when asked for a dataset
#[derive(Debug)]
pub enum LoadOutcome {
    /// A usable dataset, stored for the target epoch or a newer one
    Loaded(Dataset),
    /// No file at the slot path
    Missing,
    /// The file is for an older epoch
    Stale {
        /// Epoch id found in the header
        stored: u64,
    },
    /// The file exists but cannot be used as-is
    Invalid(String),
}

/// Fixed-path dataset file
#[derive(Debug, Clone)]
pub struct DagStore {
    path: PathBuf,
    #[cfg(test)]
    fail_with: Option<io::ErrorKind>,
}

impl DagStore {
    /// Creates a store for the given slot path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            #[cfg(test)]
            fail_with: None,
        }
    }

    /// Makes every later `persist` fail with `kind`
    #[cfg(test)]
    pub(crate) fn fail_persist_with(&mut self, kind: io::ErrorKind) {
        self.fail_with = Some(kind);
    }

    /// Slot path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Reads only the epoch header
    pub fn read_header(&self) -> io::Result<u64> {
        File::open(&self.path)?.read_u64::<BigEndian>()
    }

    /// Loads the stored dataset if it can serve `target`
    ///
    /// The header epoch must be `>= target` and the file must be exactly
    /// `HEADER_LEN + dataset_size` bytes for the header's own epoch. The
    /// contents themselves are not checked here.
    ///
    /// # Errors
    /// Only `AllocationError`; every storage problem is reported as a
    /// `LoadOutcome` so the caller can regenerate.
    pub fn load(&self, oracle: &dyn HashOracle, target: u64) -> Result<LoadOutcome, MinerError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Ok(LoadOutcome::Invalid(format!("cannot open: {}", e))),
        };

        let len = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => return Ok(LoadOutcome::Invalid(format!("cannot stat: {}", e))),
        };
        let stored = match file.read_u64::<BigEndian>() {
            Ok(epoch) => epoch,
            Err(e) => return Ok(LoadOutcome::Invalid(format!("unreadable header: {}", e))),
        };
        if stored < target {
            return Ok(LoadOutcome::Stale { stored });
        }

        let params = oracle.sizing_params(stored);
        let expected = HEADER_LEN + params.dataset_size as u64;
        if len != expected {
            return Ok(LoadOutcome::Invalid(format!(
                "file is {} bytes, epoch {} needs {}",
                len, stored, expected
            )));
        }

        match DagBuffer::from_storage(file, params.dataset_size) {
            Ok(buffer) => Ok(LoadOutcome::Loaded(Dataset::from_parts(stored, params, buffer))),
            Err(MinerError::IoError(e)) => Ok(LoadOutcome::Invalid(format!("read failed: {}", e))),
            Err(e) => Err(e),
        }
    }

    /// Overwrites the slot with `dataset`
    pub fn persist(&self, dataset: &Dataset) -> Result<(), StoreError> {
        #[cfg(test)]
        if let Some(kind) = self.fail_with {
            return Err(StoreError::classify(&self.path, io::Error::from(kind)));
        }
        let tmp = self.tmp_path();
        let result = write_dataset(&tmp, dataset).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::classify(&self.path, source));
        }
        Ok(())
    }
}

fn write_dataset(path: &Path, dataset: &Dataset) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_u64::<BigEndian>(dataset.epoch())?;
    writer.write_all(dataset.bytes())?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
