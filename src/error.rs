//! Error types for mdu
//!
//! This module defines the error hierarchy for a disk usage walk:
//! - Path access errors (non-fatal, recorded against one input root)
//! - Worker/coordination errors (fatal, abort the whole run)
//! - Configuration and CLI errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - A failing path never unwinds past the task that hit it
//! - Anything that could lose a task is fatal

use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for the mdu library
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Cancelled before completion
    #[error("Operation interrupted before the walk completed")]
    Interrupted,
}

/// A single path could not be inspected
///
/// These are absorbed by the worker: the root the path belongs to keeps
/// whatever it accumulated so far and the walk continues.
#[derive(Error, Debug)]
pub enum PathError {
    /// lstat failed
    #[error("cannot access '{}': {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory could not be opened
    #[error("cannot open directory '{}': {source}", .path.display())]
    OpenDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory enumeration failed part way through
    #[error("cannot read directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PathError {
    /// Returns the path associated with this error
    pub fn path(&self) -> &Path {
        match self {
            PathError::Stat { path, .. } => path,
            PathError::OpenDir { path, .. } => path,
            PathError::ReadDir { path, .. } => path,
        }
    }

    /// Underlying I/O error
    pub fn io_error(&self) -> &io::Error {
        match self {
            PathError::Stat { source, .. } => source,
            PathError::OpenDir { source, .. } => source,
            PathError::ReadDir { source, .. } => source,
        }
    }

    /// Check if the entry disappeared after its parent listed it
    pub fn is_vanished(&self) -> bool {
        match self {
            PathError::Stat { source, .. } | PathError::OpenDir { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            PathError::ReadDir { .. } => false,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Nothing to walk
    #[error("No input paths given")]
    NoPaths,

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },
}

/// Worker thread errors
///
/// Every variant is fatal: the coordinator is halted and the dispatcher
/// reports the failure after joining all workers.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be created
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Allocation for a task or registry entry failed
    #[error("Out of memory while growing the {what}: {source}")]
    ResourceExhausted {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    /// A lock or condition variable is unusable
    #[error("Coordination failure: {0}")]
    Coordination(String),
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Represents the outcome of processing a single task
#[derive(Debug)]
pub enum WalkOutcome {
    /// Path was stat'd (and expanded, if a directory)
    Success {
        path: PathBuf,
        blocks: u64,
        children: usize,
    },

    /// Soft failure that does not count against the root
    Skipped { path: PathBuf, reason: String },

    /// Failed with a path access error
    Failed { error: PathError },
}

impl WalkOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, WalkOutcome::Success { .. })
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &Path {
        match self {
            WalkOutcome::Success { path, .. } => path,
            WalkOutcome::Skipped { path, .. } => path,
            WalkOutcome::Failed { error } => error.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanished_detection() {
        let gone = PathError::Stat {
            path: "/tmp/gone".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(gone.is_vanished());

        let denied = PathError::Stat {
            path: "/root/secret".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_vanished());

        let open = PathError::OpenDir {
            path: "/tmp/gone".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(open.is_vanished());

        let listing = PathError::ReadDir {
            path: "/tmp/gone".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!listing.is_vanished());
    }

    #[test]
    fn test_error_conversion() {
        let worker_err = WorkerError::Coordination("poisoned".into());
        let walker_err: WalkerError = worker_err.into();
        assert!(matches!(walker_err, WalkerError::Worker(_)));

        let config_err: WalkerError = ConfigError::NoPaths.into();
        assert!(matches!(config_err, WalkerError::Config(_)));
    }

    #[test]
    fn test_outcome_path() {
        let outcome = WalkOutcome::Failed {
            error: PathError::ReadDir {
                path: "/data/dir".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.path(), Path::new("/data/dir"));
        if let WalkOutcome::Failed { error } = &outcome {
            assert!(error
                .to_string()
                .starts_with("cannot read directory '/data/dir'"));
        }
    }
}
