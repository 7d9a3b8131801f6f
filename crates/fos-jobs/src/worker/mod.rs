//! Workers
//!
//! Consumption strategies for a [`JobQueue`](crate::JobQueue):
//! - [`AmortizationWorker`]: drained in slices by a host loop (e.g. once per frame)
//! - [`ThreadWorker`]: dedicated thread blocking on the queue

mod amortization;
mod thread;

pub use amortization::AmortizationWorker;
pub use thread::{Callback, ThreadPriority, ThreadWorker, ThreadWorkerConfig};

use crate::queue::SharedJobQueue;

/// Consumer attached to a shared job queue
pub trait Worker: Send {
    /// Queue this worker drains
    fn queue(&self) -> &SharedJobQueue;

    /// Run up to `job_count` pending jobs
    ///
    /// Negative counts mean "everything pending". Strategies that drain on
    /// their own leave this as a no-op.
    fn process(&mut self, _job_count: i32) {}

    /// Stop the queue and release the worker's resources
    fn terminate(&mut self) {
        self.queue().stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobQueue;

    struct Idle {
        queue: SharedJobQueue,
    }

    impl Worker for Idle {
        fn queue(&self) -> &SharedJobQueue {
            &self.queue
        }
    }

    #[test]
    fn test_default_contract() {
        let queue = JobQueue::create();
        let mut worker: Box<dyn Worker> = Box::new(Idle {
            queue: queue.clone(),
        });
        queue.push(|| {});

        worker.process(-1);
        assert_eq!(queue.len(), 1);

        worker.terminate();
        assert!(queue.is_stopping());
    }
}
