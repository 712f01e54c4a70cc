//! Per-root usage accumulators
//!
//! Every input path gets one `RootUsage`. All tasks descending from that
//! path hold an `Arc` to it, so every block found under the root lands in
//! the same counter no matter which worker found it.

use crate::walker::registry::InodeRegistry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared accumulator for one input path
#[derive(Debug)]
pub struct RootUsage {
    /// Position of the path on the command line
    index: usize,

    /// Path exactly as supplied by the caller
    path: PathBuf,

    /// Allocation blocks counted so far
    blocks: AtomicU64,

    /// Path access errors recorded under this root
    errors: AtomicU64,

    /// Inodes already counted under this root
    registry: InodeRegistry,
}

impl RootUsage {
    /// Create a zeroed accumulator for an input path
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            blocks: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            registry: InodeRegistry::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn registry(&self) -> &InodeRegistry {
        &self.registry
    }

    /// Add blocks found somewhere under this root
    pub fn add_blocks(&self, blocks: u64) {
        self.blocks.fetch_add(blocks, Ordering::Relaxed);
    }

    /// Record a path access error under this root
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current block total
    ///
    /// Only final once every worker has been joined.
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Freeze the accumulator into a reportable value
    pub fn snapshot(&self) -> PathUsage {
        PathUsage {
            path: self.path.clone(),
            blocks: self.blocks(),
            errors: self.errors(),
        }
    }
}

/// Final usage for one input path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathUsage {
    /// Path as given on input
    pub path: PathBuf,

    /// Allocation blocks (512-byte units)
    pub blocks: u64,

    /// Path access errors hit while walking this root
    pub errors: u64,
}

impl PathUsage {
    /// Size in bytes of the counted blocks
    pub fn bytes(&self) -> u64 {
        self.blocks.saturating_mul(crate::BLOCK_SIZE)
    }

    /// True if the whole tree was traversed without errors
    pub fn is_complete(&self) -> bool {
        self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_usage_accumulates() {
        let root = RootUsage::new(2, "/data");
        root.add_blocks(8);
        root.add_blocks(16);
        root.record_error();

        let usage = root.snapshot();
        assert_eq!(root.index(), 2);
        assert_eq!(usage.path, PathBuf::from("/data"));
        assert_eq!(usage.blocks, 24);
        assert_eq!(usage.errors, 1);
        assert_eq!(usage.bytes(), 24 * 512);
        assert!(!usage.is_complete());
    }

    #[test]
    fn test_concurrent_accumulation() {
        let root = std::sync::Arc::new(RootUsage::new(0, "."));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let root = std::sync::Arc::clone(&root);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        root.add_blocks(8);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(root.blocks(), 8 * 8 * 1000);
    }
}
