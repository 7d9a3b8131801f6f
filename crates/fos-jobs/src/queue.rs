//! Job Queue
//!
//! Lock-protected FIFO store shared between producers and workers.
//! Jobs are always handed out and dropped outside the lock, so a job may
//! push, cancel or stop on the queue that delivered it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::job::{Job, JobId, next_job_id};

/// Shared queue handle
pub type SharedJobQueue = Arc<JobQueue>;

/// Result of [`JobQueue::pop`]
pub enum Popped {
    /// Oldest pending job
    Job(Job),
    /// Nothing pending, queue still running
    Empty,
    /// Nothing pending and the queue is stopping: shut down
    Stopped,
}

impl Popped {
    /// Take the job, if any
    pub fn into_job(self) -> Option<Job> {
        match self {
            Self::Job(job) => Some(job),
            Self::Empty | Self::Stopped => None,
        }
    }

    /// Check for the shutdown signal
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Check for the "nothing right now" result
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl std::fmt::Debug for Popped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Job(_) => f.write_str("Job(..)"),
            Self::Empty => f.write_str("Empty"),
            Self::Stopped => f.write_str("Stopped"),
        }
    }
}

/// Queue counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Jobs waiting for delivery
    pub pending: usize,
    /// Jobs accepted by push
    pub pushed: u64,
    /// Jobs handed to a consumer
    pub delivered: u64,
    /// Jobs removed by cancel
    pub cancelled: u64,
    /// Pushes refused (stopping queue or live id)
    pub rejected: u64,
    /// Stop has been signalled
    pub stopping: bool,
}

/// State guarded by the queue mutex
///
/// Every id in `order` has exactly one entry in `jobs` and vice versa.
#[derive(Default)]
struct QueueState {
    jobs: HashMap<JobId, Job>,
    order: VecDeque<JobId>,
    stopping: bool,
    pushed: u64,
    delivered: u64,
    cancelled: u64,
    rejected: u64,
}

impl QueueState {
    fn take_front(&mut self) -> Option<(JobId, Job)> {
        while let Some(id) = self.order.pop_front() {
            if let Some(job) = self.jobs.remove(&id) {
                self.delivered += 1;
                return Some((id, job));
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Thread-safe job queue
///
/// Only obtainable as a [`SharedJobQueue`] through [`JobQueue::create`].
pub struct JobQueue {
    state: Mutex<QueueState>,
    /// Signalled on push and stop
    available: Condvar,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("JobQueue")
            .field("pending", &state.len())
            .field("stopping", &state.stopping)
            .finish()
    }
}

impl JobQueue {
    /// Create a new shared queue
    pub fn create() -> SharedJobQueue {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve an id without queueing anything
    ///
    /// Lets a caller build a job body that refers to its own id, then hand
    /// both to [`JobQueue::push_with_id`].
    pub fn issue_job_id(&self) -> JobId {
        next_job_id()
    }

    /// Queue a job under a fresh id
    ///
    /// Returns [`JobId::INVALID`] and drops the job if the queue is stopping.
    pub fn push<F>(&self, job: F) -> JobId
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_with_id(JobId::INVALID, job)
    }

    /// Queue a job under a pre-issued id
    ///
    /// An [`JobId::INVALID`] id means "generate one". Returns the id used, or
    /// [`JobId::INVALID`] if the queue is stopping or `id` is still queued.
    pub fn push_with_id<F>(&self, id: JobId, job: F) -> JobId
    where
        F: FnOnce() + Send + 'static,
    {
        let job: Job = Box::new(job);
        let rejected = {
            let mut state = self.lock();
            if state.stopping {
                state.rejected += 1;
                tracing::trace!("Rejected push on stopping queue");
                Some(job)
            } else {
                let id = if id.is_valid() {
                    id
                } else {
                    // Ids are process-wide; only a wrapped counter can hit a live one
                    let mut fresh = next_job_id();
                    while state.jobs.contains_key(&fresh) {
                        fresh = next_job_id();
                    }
                    fresh
                };
                if state.jobs.contains_key(&id) {
                    state.rejected += 1;
                    tracing::warn!("Rejected push of {}: id is already queued", id);
                    Some(job)
                } else {
                    state.jobs.insert(id, job);
                    state.order.push_back(id);
                    state.pushed += 1;
                    drop(state);
                    self.available.notify_one();
                    tracing::trace!("Pushed {}", id);
                    return id;
                }
            }
        };
        drop(rejected);
        JobId::INVALID
    }

    /// Take the oldest pending job
    ///
    /// When nothing is pending and `should_block` is set, waits until a job
    /// is pushed or the queue stops. Jobs pushed before [`JobQueue::stop`]
    /// are still delivered; [`Popped::Stopped`] only comes once drained.
    pub fn pop(&self, should_block: bool) -> Popped {
        let mut state = self.lock();
        loop {
            if let Some((id, job)) = state.take_front() {
                tracing::trace!("Popped {}", id);
                return Popped::Job(job);
            }
            if state.stopping {
                return Popped::Stopped;
            }
            if !should_block {
                return Popped::Empty;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Take up to `limit` pending jobs in FIFO order without blocking
    ///
    /// `None` takes everything currently pending.
    pub fn pop_batch(&self, limit: Option<usize>) -> Vec<Job> {
        let mut state = self.lock();
        let count = limit.map_or(state.len(), |limit| limit.min(state.len()));
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            match state.take_front() {
                Some((_, job)) => batch.push(job),
                None => break,
            }
        }
        if !batch.is_empty() {
            tracing::debug!("Popped batch of {} jobs", batch.len());
        }
        batch
    }

    /// Remove a job that has not been delivered yet
    ///
    /// Returns `false` for unknown or already delivered ids.
    pub fn cancel(&self, id: JobId) -> bool {
        let removed = {
            let mut state = self.lock();
            let removed = state.jobs.remove(&id);
            if removed.is_some() {
                if let Some(pos) = state.order.iter().position(|queued| *queued == id) {
                    state.order.remove(pos);
                }
                state.cancelled += 1;
            }
            removed
        };
        match removed {
            Some(job) => {
                drop(job);
                tracing::trace!("Cancelled {}", id);
                true
            }
            None => false,
        }
    }

    /// Signal shutdown
    ///
    /// Further pushes are rejected; pending jobs stay poppable and
    /// cancellable. Wakes every blocked [`JobQueue::pop`]. Idempotent.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.stopping {
            return;
        }
        state.stopping = true;
        let pending = state.len();
        drop(state);
        self.available.notify_all();
        tracing::debug!("Job queue stopping with {} pending jobs", pending);
    }

    /// Check if stop has been signalled
    pub fn is_stopping(&self) -> bool {
        self.lock().stopping
    }

    /// Check if stopping with nothing left to deliver
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.stopping && state.len() == 0
    }

    /// Pending job count
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters snapshot
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            pending: state.len(),
            pushed: state.pushed,
            delivered: state.delivered,
            cancelled: state.cancelled,
            rejected: state.rejected,
            stopping: state.stopping,
        }
    }
}
