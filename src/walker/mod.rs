//! Parallel disk usage walker
//!
//! A fixed pool of worker threads drains a shared queue of paths. Every
//! directory a worker visits feeds its entries back into the same queue,
//! so the pool stays busy until the whole tree has been seen.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │       Dispatcher        │
//!                     │  - one task per path    │
//!                     │  - joins every worker   │
//!                     └───────────┬─────────────┘
//!                                 │ submit
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │       Coordinator       │
//!                     │  Mutex + Condvar        │
//!                     │  FIFO task queue        │
//!                     └───────────┬─────────────┘
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  lstat    │             │  lstat    │             │  lstat    │
//! │  readdir  │             │  readdir  │             │  readdir  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └───────── children ──────┴───── back to queue ─────┘
//! ```

pub mod coordinator;
pub mod dispatcher;
pub mod queue;
pub mod registry;
pub mod usage;
pub mod worker;

pub use coordinator::{CancelHandle, Coordinator, HaltReason, Phase};
pub use dispatcher::{run, Dispatcher, WalkResult};
pub use queue::{QueueStats, Task, TaskQueue};
pub use registry::{InodeKey, InodeRegistry};
pub use usage::{PathUsage, RootUsage};
pub use worker::{WalkStats, Worker, WorkerStats};
