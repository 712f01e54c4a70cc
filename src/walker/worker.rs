//! Worker thread logic for parallel disk usage walking
//!
//! Each worker:
//! - Pulls tasks from the shared coordinator
//! - lstats the task's path (symlinks are never followed)
//! - Adds the blocks to the root's accumulator unless the inode was
//!   already counted under that root
//! - Submits every entry of a directory back to the coordinator
//!
//! Path access errors are absorbed here and recorded against the root.
//! Anything else halts the coordinator and is returned from the thread.

use crate::error::{PathError, WalkOutcome, WorkerError};
use crate::walker::coordinator::Coordinator;
use crate::walker::queue::Task;
use crate::walker::registry::InodeKey;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Paths stat'd successfully
    pub entries: AtomicU64,

    /// Directories expanded
    pub dirs: AtomicU64,

    /// Entries whose inode had already been counted
    pub duplicates: AtomicU64,

    /// Path access errors
    pub errors: AtomicU64,

    /// Entries that vanished before they could be stat'd
    pub vanished: AtomicU64,
}

impl WorkerStats {
    fn record_entry(&self) {
        self.entries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_vanished(&self) {
        self.vanished.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals across all workers of a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub entries: u64,
    pub dirs: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub vanished: u64,
}

/// A worker thread that processes tasks
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<Result<(), WorkerError>>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(id: usize, coordinator: Arc<Coordinator>) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("mdu-worker-{}", id))
            .spawn(move || worker_loop(id, &coordinator, &stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(&mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result,
                Err(payload) => Err(WorkerError::Panicked {
                    id: self.id,
                    message: panic_message(payload.as_ref()),
                }),
            }
        } else {
            Ok(())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Worker thread panicked".into()
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    coordinator: &Coordinator,
    stats: &WorkerStats,
) -> Result<(), WorkerError> {
    debug!(worker = id, "Worker starting");

    let result = drain_tasks(id, coordinator, stats);
    if let Err(e) = &result {
        error!(worker = id, error = %e, "Worker failed, halting walk");
        coordinator.abort();
    }

    debug!(
        worker = id,
        entries = stats.entries.load(Ordering::Relaxed),
        dirs = stats.dirs.load(Ordering::Relaxed),
        "Worker shutting down"
    );

    result
}

fn drain_tasks(
    id: usize,
    coordinator: &Coordinator,
    stats: &WorkerStats,
) -> Result<(), WorkerError> {
    while let Some(guard) = coordinator.next_task()? {
        let task = guard.task();
        let outcome = process_task(task, coordinator, stats)?;

        match &outcome {
            WalkOutcome::Success {
                blocks, children, ..
            } => {
                trace!(worker = id, path = %task.path.display(), blocks, children, "Path processed");
            }
            WalkOutcome::Skipped { path, reason } => {
                debug!(worker = id, path = %path.display(), reason = %reason, "Path skipped");
            }
            WalkOutcome::Failed { error } => {
                warn!(worker = id, "{}", error);
            }
        }
    }

    Ok(())
}

/// Process a single task
///
/// Returns `Err` only for fatal errors; a path that cannot be read is a
/// `Failed` outcome recorded against the task's root.
pub(crate) fn process_task(
    task: &Task,
    coordinator: &Coordinator,
    stats: &WorkerStats,
) -> Result<WalkOutcome, WorkerError> {
    let meta = match fs::symlink_metadata(&task.path) {
        Ok(meta) => meta,
        Err(source) => {
            let error = PathError::Stat {
                path: task.path.clone(),
                source,
            };
            return Ok(skip_or_fail(task, stats, error));
        }
    };

    stats.record_entry();

    let mut blocks = 0;
    if task.root.registry().seen_or_record(InodeKey::from_metadata(&meta))? {
        stats.record_duplicate();
    } else {
        blocks = meta.blocks();
        task.root.add_blocks(blocks);
    }

    // Directories are expanded even when their inode was already counted
    if !meta.is_dir() {
        return Ok(WalkOutcome::Success {
            path: task.path.clone(),
            blocks,
            children: 0,
        });
    }

    let entries = match fs::read_dir(&task.path) {
        Ok(entries) => entries,
        Err(source) => {
            let error = PathError::OpenDir {
                path: task.path.clone(),
                source,
            };
            return Ok(skip_or_fail(task, stats, error));
        }
    };

    stats.record_dir();

    // read_dir never yields "." or ".."
    let names = entries.map(|entry| entry.map(|entry| entry.file_name()));
    submit_children(task, names, blocks, coordinator, stats)
}

/// Submit one child task per name
///
/// A listing that fails part way keeps the children already submitted and
/// the blocks already counted; the directory itself is recorded as failed.
fn submit_children<I>(
    task: &Task,
    names: I,
    blocks: u64,
    coordinator: &Coordinator,
    stats: &WorkerStats,
) -> Result<WalkOutcome, WorkerError>
where
    I: IntoIterator<Item = io::Result<OsString>>,
{
    let mut children = 0;
    for name in names {
        let name = match name {
            Ok(name) => name,
            Err(source) => {
                let error = PathError::ReadDir {
                    path: task.path.clone(),
                    source,
                };
                return Ok(fail(task, stats, error));
            }
        };

        coordinator.submit(task.child(&name))?;
        children += 1;
    }

    Ok(WalkOutcome::Success {
        path: task.path.clone(),
        blocks,
        children,
    })
}

/// Entries removed after their parent listed them are skipped; input paths
/// and every other error count against the root
fn skip_or_fail(task: &Task, stats: &WorkerStats, error: PathError) -> WalkOutcome {
    if error.is_vanished() && !task.is_root() {
        stats.record_vanished();
        return WalkOutcome::Skipped {
            path: task.path.clone(),
            reason: "Entry vanished during walk".into(),
        };
    }

    fail(task, stats, error)
}

fn fail(task: &Task, stats: &WorkerStats, error: PathError) -> WalkOutcome {
    stats.record_error();
    task.root.record_error();
    WalkOutcome::Failed { error }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> WalkStats {
    let mut totals = WalkStats::default();

    for worker in workers {
        totals.entries += worker.stats.entries.load(Ordering::Relaxed);
        totals.dirs += worker.stats.dirs.load(Ordering::Relaxed);
        totals.duplicates += worker.stats.duplicates.load(Ordering::Relaxed);
        totals.errors += worker.stats.errors.load(Ordering::Relaxed);
        totals.vanished += worker.stats.vanished.load(Ordering::Relaxed);
    }

    totals
}
