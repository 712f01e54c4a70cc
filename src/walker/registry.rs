//! Inode registry for hard-link deduplication
//!
//! A file with several hard links is reachable through several directory
//! entries but occupies its blocks once. The registry remembers every
//! (device, inode) pair already counted so the second and later sightings
//! contribute nothing.
//!
//! The registry has its own lock, separate from the work queue lock, so
//! lookups never stall task dispatch.

use crate::error::WorkerError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

/// Identity of the storage object behind a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    /// Device the inode lives on
    pub dev: u64,

    /// Inode number within that device
    pub ino: u64,
}

impl InodeKey {
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Key for the object described by an lstat result
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }
}

/// Thread-safe set of counted inodes
#[derive(Debug, Default)]
pub struct InodeRegistry {
    seen: Mutex<HashSet<InodeKey>>,
}

impl InodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `key` was already counted, recording it if not
    ///
    /// Returns `Ok(true)` if the key was present before this call. The
    /// test and the insert happen under one lock hold, so of several
    /// concurrent callers with the same key exactly one sees `false`.
    pub fn seen_or_record(&self, key: InodeKey) -> Result<bool, WorkerError> {
        let mut seen = self.seen.lock();
        if seen.contains(&key) {
            return Ok(true);
        }

        seen.try_reserve(1)
            .map_err(|source| WorkerError::ResourceExhausted {
                what: "inode registry",
                source,
            })?;
        seen.insert(key);
        Ok(false)
    }

    /// Number of distinct inodes recorded
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
