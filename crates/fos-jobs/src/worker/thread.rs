//! Thread Worker
//!
//! Dedicated background thread that blocks on the queue until shutdown.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;
use crate::queue::{Popped, SharedJobQueue};

use super::Worker;

/// Lifecycle hook run on the worker thread
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Requested OS scheduling priority for a worker thread
///
/// Recorded and reported only; applying it is up to platform bindings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ThreadPriority {
    /// Background cleanup
    Lowest = 0,
    /// Prefetch, decoding
    Low = 1,
    #[default]
    Normal = 2,
    /// Frame-critical work
    High = 3,
    /// Audio and compositor
    Highest = 4,
}

impl ThreadPriority {
    /// Get priority name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }
}

impl std::fmt::Display for ThreadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Thread worker configuration
pub struct ThreadWorkerConfig {
    /// Thread name
    pub name: String,
    /// Requested priority
    pub priority: ThreadPriority,
    /// Run on the worker thread before the first job
    pub on_begin: Option<Callback>,
    /// Run on the worker thread after the last job
    pub on_end: Option<Callback>,
}

impl std::fmt::Debug for ThreadWorkerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadWorkerConfig")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("on_begin", &self.on_begin.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

impl Default for ThreadWorkerConfig {
    fn default() -> Self {
        Self {
            name: "fos-job-worker".to_string(),
            priority: ThreadPriority::Normal,
            on_begin: None,
            on_end: None,
        }
    }
}

impl ThreadWorkerConfig {
    /// Create config for a named thread
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Set the requested priority
    pub fn with_priority(mut self, priority: ThreadPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the hook run before the first job
    pub fn on_begin<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_begin = Some(Box::new(callback));
        self
    }

    /// Set the hook run after the last job
    pub fn on_end<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_end = Some(Box::new(callback));
        self
    }
}

/// Worker owning one background thread
pub struct ThreadWorker {
    queue: SharedJobQueue,
    name: String,
    priority: ThreadPriority,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl ThreadWorker {
    /// Start draining `queue` on a new thread
    pub fn spawn(queue: SharedJobQueue, config: ThreadWorkerConfig) -> Result<Self, WorkerError> {
        let ThreadWorkerConfig {
            name,
            priority,
            on_begin,
            on_end,
        } = config;

        let thread_queue = Arc::clone(&queue);
        let thread_name = name.clone();
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || drain(&thread_queue, &thread_name, priority, on_begin, on_end))
            .map_err(|source| WorkerError::Spawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            queue,
            name,
            priority,
            thread: Some(thread),
        })
    }

    /// Get thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get requested priority
    pub fn priority(&self) -> ThreadPriority {
        self.priority
    }

    /// Check if the background thread is still draining
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

/// Background thread body
fn drain(
    queue: &SharedJobQueue,
    name: &str,
    priority: ThreadPriority,
    on_begin: Option<Callback>,
    on_end: Option<Callback>,
) {
    tracing::info!("Worker thread '{}' started ({} priority)", name, priority);

    if let Some(on_begin) = on_begin {
        on_begin();
    }

    let mut executed: u64 = 0;
    loop {
        match queue.pop(true) {
            Popped::Job(job) => {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!("Job panicked on worker thread '{}'", name);
                }
                executed += 1;
            }
            // Blocking pops never come back empty while running
            Popped::Empty | Popped::Stopped => break,
        }
    }

    if let Some(on_end) = on_end {
        on_end();
    }

    tracing::info!("Worker thread '{}' exiting after {} jobs", name, executed);
}

impl Worker for ThreadWorker {
    fn queue(&self) -> &SharedJobQueue {
        &self.queue
    }

    /// Stop the queue and join the background thread
    fn terminate(&mut self) {
        self.queue.stop();

        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == thread::current().id() {
            // Terminated from one of its own jobs; the loop exits on its own
            return;
        }
        if thread.join().is_err() {
            tracing::error!("Worker thread '{}' panicked", self.name);
        }
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}
