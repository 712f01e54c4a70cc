//! Shared coordinator - the work queue and termination protocol
//!
//! The coordinator is responsible for:
//! - Handing tasks from the queue to idle workers
//! - Waking a worker for every submitted task
//! - Deciding, without a race, when no more work can ever arrive
//! - Halting every worker on cancellation or fatal failure
//!
//! # Lifecycle
//!
//! ```text
//!  Running ──mark_submission_complete──▶ Draining ──queue empty, none active──▶ terminated
//!     │                                      │
//!     └──────────── abort / cancel ──────────┴──▶ Halted
//! ```
//!
//! A worker leaves its wait loop only when the dispatcher is done
//! submitting, the queue is empty, and no other worker is still holding a
//! task. The last condition keeps idle workers alive while a directory is
//! being expanded, since that expansion may still submit children.

use crate::error::WorkerError;
use crate::walker::queue::{QueueStats, Task, TaskQueue};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Where the walk is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The dispatcher may still submit initial tasks
    Running,

    /// All initial tasks are in; workers finish queued and spawned work
    Draining,

    /// Stopped early; workers exit without draining
    Halted(HaltReason),
}

/// Why a walk was halted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// A worker hit a fatal error
    Aborted,

    /// Cancelled from outside
    Cancelled,
}

/// State guarded by the coordinator lock
#[derive(Debug)]
struct State {
    queue: TaskQueue,
    phase: Phase,

    /// Workers currently holding a task
    active: usize,
}

/// Shared state for one walk
#[derive(Debug)]
pub struct Coordinator {
    state: Mutex<State>,

    /// Signalled when a task is queued or the phase changes
    available: Condvar,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    /// Create a coordinator with an empty queue in the `Running` phase
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                queue: TaskQueue::new(),
                phase: Phase::Running,
                active: 0,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, WorkerError> {
        self.state
            .lock()
            .map_err(|_| WorkerError::Coordination("coordinator lock poisoned".into()))
    }

    /// Lock for paths that must make progress even after a panic elsewhere
    fn lock_unchecked(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a task and wake one waiting worker
    pub fn submit(&self, task: Task) -> Result<(), WorkerError> {
        let mut state = self.lock()?;
        state.queue.enqueue(task)?;
        self.available.notify_one();
        Ok(())
    }

    /// Declare that the dispatcher will submit nothing more
    ///
    /// Wakes every waiting worker so each re-evaluates its exit condition.
    /// Has no effect on the phase once the walk is halted.
    pub fn mark_submission_complete(&self) -> Result<(), WorkerError> {
        let mut state = self.lock()?;
        if state.phase == Phase::Running {
            state.phase = Phase::Draining;
        }
        self.available.notify_all();
        Ok(())
    }

    /// Block until a task is available or the walk is over
    ///
    /// Returns `None` once the walk has terminated or been halted. The
    /// returned guard marks the caller as active until it is dropped.
    pub fn next_task(&self) -> Result<Option<WorkGuard<'_>>, WorkerError> {
        let mut state = self.lock()?;

        loop {
            if let Phase::Halted(_) = state.phase {
                return Ok(None);
            }

            if let Some(task) = state.queue.dequeue() {
                state.active += 1;
                return Ok(Some(WorkGuard {
                    coordinator: self,
                    task,
                }));
            }

            if state.phase == Phase::Draining && state.active == 0 {
                return Ok(None);
            }

            state = self
                .available
                .wait(state)
                .map_err(|_| WorkerError::Coordination("wait for work failed".into()))?;
        }
    }

    /// Called when a worker is done with its task
    fn finish_task(&self) {
        let mut state = self.lock_unchecked();
        state.active = state.active.saturating_sub(1);

        if state.active == 0 && state.queue.is_empty() && state.phase == Phase::Draining {
            self.available.notify_all();
        }
    }

    /// Halt after a fatal error
    pub fn abort(&self) {
        self.halt(HaltReason::Aborted);
    }

    /// Halt on request
    pub fn cancel(&self) {
        self.halt(HaltReason::Cancelled);
    }

    fn halt(&self, reason: HaltReason) {
        let mut state = self.lock_unchecked();
        if !matches!(state.phase, Phase::Halted(_)) {
            state.phase = Phase::Halted(reason);
        }
        self.available.notify_all();
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.lock_unchecked().phase
    }

    /// True once draining has finished with nothing left anywhere
    pub fn is_terminated(&self) -> bool {
        let state = self.lock_unchecked();
        state.phase == Phase::Draining && state.queue.is_empty() && state.active == 0
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.lock_unchecked().queue.len()
    }

    /// Number of workers holding a task
    pub fn active(&self) -> usize {
        self.lock_unchecked().active
    }

    /// Get queue statistics
    pub fn queue_stats(&self) -> QueueStats {
        self.lock_unchecked().queue.stats()
    }

    /// Poison the state lock the way a panic inside a critical section
    /// would, then wake every waiter so it observes the poisoning
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _state = self.state.lock();
                    panic!("panic while holding the coordinator lock");
                })
                .join();
        });
        self.available.notify_all();
    }
}

/// RAII guard for a claimed task
///
/// Dropping the guard reports the task as finished. If the worker is
/// unwinding from a panic, the walk is aborted first so no other worker
/// waits on work that will never be submitted.
pub struct WorkGuard<'a> {
    coordinator: &'a Coordinator,
    task: Task,
}

impl<'a> WorkGuard<'a> {
    /// The claimed task
    pub fn task(&self) -> &Task {
        &self.task
    }
}

impl<'a> Drop for WorkGuard<'a> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.coordinator.abort();
        }
        self.coordinator.finish_task();
    }
}

/// Handle for cancelling a walk from another thread
#[derive(Clone)]
pub struct CancelHandle {
    coordinator: Arc<Coordinator>,
}

impl CancelHandle {
    pub(crate) fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Stop the walk; workers exit at their next wait
    pub fn cancel(&self) {
        self.coordinator.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::usage::RootUsage;
    use std::ffi::OsStr;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::Duration;

    const HANG_TIMEOUT: Duration = Duration::from_secs(10);

    fn root_task(path: &str) -> Task {
        Task::root(Arc::new(RootUsage::new(0, path)))
    }

    #[test]
    fn test_claim_in_submission_order() {
        let coordinator = Coordinator::new();
        coordinator.submit(root_task("/a")).unwrap();
        coordinator.submit(root_task("/b")).unwrap();
        coordinator.mark_submission_complete().unwrap();
        assert_eq!(coordinator.phase(), Phase::Draining);

        let first = coordinator.next_task().unwrap().unwrap();
        assert_eq!(first.task().path, PathBuf::from("/a"));
        assert_eq!(coordinator.active(), 1);
        drop(first);

        let second = coordinator.next_task().unwrap().unwrap();
        assert_eq!(second.task().path, PathBuf::from("/b"));
        drop(second);

        assert!(coordinator.next_task().unwrap().is_none());
        assert!(coordinator.is_terminated());
        assert_eq!(coordinator.queue_stats().dequeued, 2);
    }

    #[test]
    fn test_idle_workers_exit_after_completion() {
        let coordinator = Arc::new(Coordinator::new());
        let (tx, rx) = mpsc::channel();

        for _ in 0..4 {
            let coordinator = Arc::clone(&coordinator);
            let tx = tx.clone();
            thread::spawn(move || {
                let got_task = coordinator.next_task().unwrap().is_some();
                tx.send(got_task).unwrap();
            });
        }

        // Nobody may leave before submission is complete
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        coordinator.mark_submission_complete().unwrap();
        for _ in 0..4 {
            assert!(!rx.recv_timeout(HANG_TIMEOUT).unwrap());
        }
    }

    #[test]
    fn test_active_worker_holds_off_termination() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator.submit(root_task("/root")).unwrap();
        coordinator.mark_submission_complete().unwrap();

        let parent = coordinator.next_task().unwrap().unwrap();
        let (tx, rx) = mpsc::channel();

        let helper = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                while let Some(guard) = coordinator.next_task().unwrap() {
                    tx.send(Some(guard.task().path.clone())).unwrap();
                }
                tx.send(None).unwrap();
            })
        };

        // Queue is empty and submission is done, but the parent is active
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        coordinator
            .submit(parent.task().child(OsStr::new("child")))
            .unwrap();
        assert_eq!(
            rx.recv_timeout(HANG_TIMEOUT).unwrap(),
            Some(PathBuf::from("/root/child"))
        );

        // The helper is idle again; it must wait for the parent to finish
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        drop(parent);
        assert_eq!(rx.recv_timeout(HANG_TIMEOUT).unwrap(), None);
        helper.join().unwrap();
        assert!(coordinator.is_terminated());
    }

    #[test]
    fn test_cancel_wakes_waiters() {
        let coordinator = Arc::new(Coordinator::new());
        let (tx, rx) = mpsc::channel();

        for _ in 0..3 {
            let coordinator = Arc::clone(&coordinator);
            let tx = tx.clone();
            thread::spawn(move || {
                tx.send(coordinator.next_task().unwrap().is_none()).unwrap();
            });
        }

        let handle = CancelHandle::new(Arc::clone(&coordinator));
        handle.cancel();
        for _ in 0..3 {
            assert!(rx.recv_timeout(HANG_TIMEOUT).unwrap());
        }

        // Halting is final
        coordinator.mark_submission_complete().unwrap();
        assert_eq!(coordinator.phase(), Phase::Halted(HaltReason::Cancelled));
    }

    #[test]
    fn test_halted_coordinator_hands_out_nothing() {
        let coordinator = Coordinator::new();
        coordinator.submit(root_task("/a")).unwrap();
        coordinator.abort();

        assert!(coordinator.next_task().unwrap().is_none());
        assert_eq!(coordinator.pending(), 1);
        assert!(!coordinator.is_terminated());
    }

    #[test]
    fn test_panic_while_holding_task_aborts() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator.submit(root_task("/a")).unwrap();

        let result = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let _guard = coordinator.next_task().unwrap();
                panic!("boom");
            })
            .join()
        };

        assert!(result.is_err());
        assert_eq!(coordinator.phase(), Phase::Halted(HaltReason::Aborted));
        assert_eq!(coordinator.active(), 0);
    }

    #[test]
    fn test_poisoned_lock_is_a_coordination_failure() {
        let coordinator = Coordinator::new();
        coordinator.poison();

        assert!(matches!(
            coordinator.submit(root_task("/a")),
            Err(WorkerError::Coordination(_))
        ));
        assert!(matches!(
            coordinator.next_task(),
            Err(WorkerError::Coordination(_))
        ));

        // Halting still goes through
        coordinator.abort();
        assert_eq!(coordinator.phase(), Phase::Halted(HaltReason::Aborted));
    }
}
