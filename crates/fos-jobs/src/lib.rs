//! fOS Jobs
//!
//! Thread-safe job queue with pluggable consumption strategies.
//!
//! # Components
//! - [`JobQueue`]: synchronized FIFO store with id issuance, cancellation and shutdown
//! - [`Worker`]: consumption strategy attached to a queue
//! - [`AmortizationWorker`]: drained in slices from a host loop
//! - [`ThreadWorker`]: dedicated thread blocking on the queue
//!
//! # Example
//! ```rust
//! use fos_jobs::{AmortizationWorker, JobQueue, Worker};
//!
//! let queue = JobQueue::create();
//! let mut worker = AmortizationWorker::new(queue.clone());
//!
//! let id = queue.push(|| println!("deferred"));
//! assert!(id.is_valid());
//!
//! // Once per frame
//! worker.process(8);
//! worker.terminate();
//! ```

mod error;
mod job;
mod queue;
pub mod worker;

pub use error::WorkerError;
pub use job::{Job, JobId};
pub use queue::{JobQueue, Popped, QueueStats, SharedJobQueue};
pub use worker::{
    AmortizationWorker, Callback, ThreadPriority, ThreadWorker, ThreadWorkerConfig, Worker,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
