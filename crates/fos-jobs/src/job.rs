//! Job Identity
//!
//! Job bodies and the handles used to refer to them once queued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Deferred unit of work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Opaque job handle
///
/// Issued by a [`JobQueue`](crate::JobQueue) from a monotonically increasing
/// counter. [`JobId::INVALID`] means "no job" and is what a rejected push
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Sentinel for "no job"
    pub const INVALID: JobId = JobId(0);

    /// Check that this is not the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Raw counter value
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "job#{}", self.0)
        } else {
            write!(f, "job#invalid")
        }
    }
}

/// Process-wide id counter, shared by every queue
static NEXT_JOB_ID: JobIdGenerator = JobIdGenerator::new();

/// Issue an id no other queue has handed out
pub(crate) fn next_job_id() -> JobId {
    NEXT_JOB_ID.next_id()
}

/// Monotonic id counter
///
/// Wraps around after `u64::MAX` issues, skipping the sentinel. Ids are not
/// guaranteed unique across the wrap.
#[derive(Debug)]
pub(crate) struct JobIdGenerator {
    next: AtomicU64,
}

impl JobIdGenerator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> JobId {
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            if raw != JobId::INVALID.0 {
                return JobId(raw);
            }
        }
    }

    #[cfg(test)]
    fn starting_at(raw: u64) -> Self {
        Self {
            next: AtomicU64::new(raw),
        }
    }
}
