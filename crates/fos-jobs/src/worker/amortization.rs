//! Amortization Worker
//!
//! Non-blocking consumer driven by the caller, spreading queued work over
//! repeated `process` calls.

use crate::queue::{Popped, SharedJobQueue};

use super::Worker;

/// Caller-driven worker that runs jobs on the calling thread
#[derive(Debug)]
pub struct AmortizationWorker {
    queue: SharedJobQueue,
}

impl AmortizationWorker {
    /// Attach to a queue
    pub fn new(queue: SharedJobQueue) -> Self {
        Self { queue }
    }

    /// Run up to `job_count` pending jobs, returning how many ran
    ///
    /// `0` does nothing, `1` pops a single job, larger counts take a batch
    /// and negative counts run everything pending.
    pub fn run(&self, job_count: i32) -> usize {
        match job_count {
            0 => 0,
            1 => match self.queue.pop(false) {
                Popped::Job(job) => {
                    job();
                    1
                }
                Popped::Empty | Popped::Stopped => 0,
            },
            count => {
                let limit = usize::try_from(count).ok();
                let batch = self.queue.pop_batch(limit);
                let ran = batch.len();
                for job in batch {
                    job();
                }
                ran
            }
        }
    }
}

impl Worker for AmortizationWorker {
    fn queue(&self) -> &SharedJobQueue {
        &self.queue
    }

    fn process(&mut self, job_count: i32) {
        self.run(job_count);
    }

    /// Stop the queue and run whatever is still pending
    fn terminate(&mut self) {
        self.queue.stop();
        let ran = self.run(-1);
        if ran > 0 {
            tracing::debug!("Amortization worker drained {} jobs on terminate", ran);
        }
    }
}
