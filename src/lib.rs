//! mdu - Parallel Disk Usage Calculator
//!
//! Computes the space each input path occupies on disk, in filesystem
//! allocation blocks, by walking directory trees with a fixed pool of
//! worker threads.
//!
//! # Features
//!
//! - **Parallel Traversal**: Workers share one queue of pending paths;
//!   each directory visited pushes its entries back onto the queue.
//!
//! - **Hard-Link Aware**: A file reachable through several links is
//!   counted once per input path, keyed by (device, inode).
//!
//! - **Fault Tolerant**: A path that cannot be read is reported and the
//!   walk carries on; its root keeps whatever was counted.
//!
//! - **No Symlink Following**: Paths are inspected with lstat, so a link
//!   contributes its own blocks and never its target's.
//!
//! # Example
//!
//! ```bash
//! # Two trees, eight workers
//! mdu -j 8 /usr /var
//!
//! # Human-readable sizes with a summary on stderr
//! mdu -j 4 -H -s ~/projects
//! ```
//!
//! ```no_run
//! let usages = mdu::run(["/usr", "/var"], 8)?;
//! for usage in usages {
//!     println!("{}\t{}", usage.blocks, usage.path.display());
//! }
//! # Ok::<(), mdu::WalkerError>(())
//! ```

#[cfg(not(unix))]
compile_error!("mdu relies on Unix inode metadata and only builds on Unix platforms");

pub mod config;
pub mod error;
pub mod report;
pub mod walker;

/// Size in bytes of the unit `st_blocks` is expressed in
pub const BLOCK_SIZE: u64 = 512;

pub use config::{CliArgs, WalkConfig};
pub use error::{Result, WalkerError};
pub use walker::{run, CancelHandle, Dispatcher, PathUsage, WalkResult};
