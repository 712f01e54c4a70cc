//! Dispatcher - seeds the walk and collects per-path totals
//!
//! The dispatcher is responsible for:
//! - Starting the worker pool
//! - Submitting one task per input path
//! - Marking submission complete and joining every worker
//! - Reporting totals in argument order

use crate::error::{Result, WalkerError, WorkerError};
use crate::walker::coordinator::{CancelHandle, Coordinator, HaltReason, Phase};
use crate::walker::queue::Task;
use crate::walker::usage::{PathUsage, RootUsage};
use crate::walker::worker::{aggregate_stats, WalkStats, Worker};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed walk
#[derive(Debug)]
pub struct WalkResult {
    /// One entry per input path, in input order
    pub usages: Vec<PathUsage>,

    /// Counters summed over all workers
    pub stats: WalkStats,

    /// Largest queue length seen
    pub peak_queue_len: usize,

    /// Time taken for the walk
    pub duration: Duration,
}

impl WalkResult {
    /// Sum of blocks over all input paths
    pub fn total_blocks(&self) -> u64 {
        self.usages.iter().map(|u| u.blocks).sum()
    }

    /// True if every input path was walked without errors
    pub fn is_complete(&self) -> bool {
        self.usages.iter().all(PathUsage::is_complete)
    }
}

/// Runs one disk usage walk over a set of input paths
pub struct Dispatcher {
    /// Input paths in the order given
    paths: Vec<PathBuf>,

    /// Pool size (at least 1)
    worker_count: usize,

    /// Shared state for this walk only
    coordinator: Arc<Coordinator>,
}

impl Dispatcher {
    /// Create a dispatcher; a worker count below 1 means 1
    pub fn new<I, P>(paths: I, worker_count: usize) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            worker_count: worker_count.max(1),
            coordinator: Arc::new(Coordinator::new()),
        }
    }

    /// Handle for cancelling the walk (e.g. from a signal handler)
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.coordinator))
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run the walk to completion
    pub fn run(self) -> Result<WalkResult> {
        let start_time = Instant::now();

        info!(
            paths = self.paths.len(),
            workers = self.worker_count,
            "Starting disk usage walk"
        );

        let roots: Vec<Arc<RootUsage>> = self
            .paths
            .iter()
            .enumerate()
            .map(|(index, path)| Arc::new(RootUsage::new(index, path.clone())))
            .collect();

        let mut workers = Vec::with_capacity(self.worker_count);
        let mut failure = self.spawn_workers(&mut workers).err();

        if failure.is_none() {
            failure = self.seed(&roots).err();
        }

        if failure.is_some() {
            self.coordinator.abort();
        }

        // Every spawned worker is joined, even after a failure
        for worker in &mut workers {
            if let Err(e) = worker.join() {
                warn!(worker = worker.id(), error = %e, "Worker failed");
                failure.get_or_insert(e);
            }
        }
        let stats = aggregate_stats(&workers);

        if let Some(e) = failure {
            return Err(WalkerError::Worker(e));
        }

        if self.coordinator.phase() == Phase::Halted(HaltReason::Cancelled) {
            info!("Walk was interrupted before completion");
            return Err(WalkerError::Interrupted);
        }

        let queue_stats = self.coordinator.queue_stats();
        debug!(
            enqueued = queue_stats.enqueued,
            dequeued = queue_stats.dequeued,
            peak = queue_stats.peak_len,
            "Queue drained"
        );

        // No writers remain once all workers are joined
        let usages: Vec<PathUsage> = roots.iter().map(|root| root.snapshot()).collect();
        let duration = start_time.elapsed();

        info!(
            entries = stats.entries,
            dirs = stats.dirs,
            duplicates = stats.duplicates,
            errors = stats.errors,
            duration_ms = duration.as_millis() as u64,
            "Walk completed"
        );

        Ok(WalkResult {
            usages,
            stats,
            peak_queue_len: queue_stats.peak_len,
            duration,
        })
    }

    /// Spawn worker threads
    fn spawn_workers(&self, workers: &mut Vec<Worker>) -> std::result::Result<(), WorkerError> {
        for id in 0..self.worker_count {
            let worker = Worker::spawn(id, Arc::clone(&self.coordinator))?;
            workers.push(worker);
        }

        debug!(count = workers.len(), "Workers spawned");
        Ok(())
    }

    /// Submit the initial tasks, then close submission
    fn seed(&self, roots: &[Arc<RootUsage>]) -> std::result::Result<(), WorkerError> {
        for root in roots {
            debug!(path = %root.path().display(), "Seeding input path");
            self.coordinator.submit(Task::root(Arc::clone(root)))?;
        }

        self.coordinator.mark_submission_complete()
    }
}

/// Compute the disk usage of each path with a pool of `thread_count` workers
///
/// Results are returned in the order of `paths`. A thread count below 1
/// is treated as 1.
pub fn run<I, P>(paths: I, thread_count: usize) -> Result<Vec<PathUsage>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    Dispatcher::new(paths, thread_count)
        .run()
        .map(|result| result.usages)
}
