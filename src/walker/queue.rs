//! Task queue for pending paths
//!
//! This module provides the unbounded FIFO of paths waiting to be visited.
//! The queue itself is not synchronized: the coordinator owns it behind
//! its mutex so that every push/pop is observed together with the wake-up
//! decision made under the same lock.
//!
//! Growth is fallible. A task that cannot be stored is reported as
//! `ResourceExhausted` rather than dropped, since a lost task is a silent
//! undercount.

use crate::error::WorkerError;
use crate::walker::usage::RootUsage;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;

/// A path waiting to be visited
#[derive(Debug, Clone)]
pub struct Task {
    /// Path to lstat (and expand, if it is a directory)
    pub path: PathBuf,

    /// Accumulator of the input path this task descends from
    pub root: Arc<RootUsage>,

    /// Depth from root (0 = the input path itself)
    pub depth: u32,
}

impl Task {
    /// Create the initial task for an input path
    pub fn root(root: Arc<RootUsage>) -> Self {
        Self {
            path: root.path().to_path_buf(),
            root,
            depth: 0,
        }
    }

    /// Create a task for an entry of this (directory) task
    ///
    /// The child shares the parent's accumulator.
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            path: self.path.join(name),
            root: Arc::clone(&self.root),
            depth: self.depth + 1,
        }
    }

    /// True for the task created from the input path itself
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// Statistics for the task queue
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: u64,

    /// Total tasks dequeued
    pub dequeued: u64,

    /// Largest length the queue reached
    pub peak_len: usize,
}

/// Unbounded FIFO of tasks
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
    stats: QueueStats,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the back of the queue
    pub fn enqueue(&mut self, task: Task) -> Result<(), WorkerError> {
        self.tasks
            .try_reserve(1)
            .map_err(|source| WorkerError::ResourceExhausted {
                what: "task queue",
                source,
            })?;
        self.tasks.push_back(task);

        self.stats.enqueued += 1;
        self.stats.peak_len = self.stats.peak_len.max(self.tasks.len());
        Ok(())
    }

    /// Take the task at the front of the queue
    ///
    /// Returns `None` when the queue is empty; never blocks.
    pub fn dequeue(&mut self) -> Option<Task> {
        let task = self.tasks.pop_front()?;
        self.stats.dequeued += 1;
        Some(task)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        self.stats
    }
}
