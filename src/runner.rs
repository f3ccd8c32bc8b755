//! Bounded-concurrency task runner with a drain barrier
//!
//! A fixed pool of worker threads executes submitted tasks. Tasks receive a
//! handle to the runner and may submit further tasks. [`TaskRunner::await_drain`]
//! blocks until every submitted task, and everything those tasks submitted in
//! turn, has finished.
//!
//! Queue emptiness is not enough to detect completion once tasks can refill the
//! queue, so the runner keeps an explicit pending counter. It is incremented
//! before a task becomes visible to workers and decremented only after the task
//! returns. A child's increment therefore always happens before its parent's
//! decrement, and the counter can never read zero while descendants remain.

use crate::config::ConfigError;
use anyhow::{Context, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Outstanding work counter with a wake-up on zero
#[derive(Debug, Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }
}

/// Releases one unit of pending work when dropped, including on unwind
struct PendingGuard(Arc<Pending>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Cloneable handle to a shared worker pool
#[derive(Clone)]
pub struct TaskRunner {
    pool: Arc<rayon::ThreadPool>,
    pending: Arc<Pending>,
    workers: usize,
}

impl TaskRunner {
    /// Start `workers` persistent worker threads
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(ConfigError::InvalidThreads(workers).into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("crawldex-worker-{}", i))
            .panic_handler(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(panic = %message, "task panicked");
            })
            .build()
            .context("Failed to start worker pool")?;

        tracing::debug!(workers, "task runner started");

        Ok(Self {
            pool: Arc::new(pool),
            pending: Arc::new(Pending::default()),
            workers,
        })
    }

    /// Queue a task. It runs on a worker and may submit more tasks through the
    /// handle it is given.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce(&TaskRunner) + Send + 'static,
    {
        // Counted before the task can be picked up
        self.pending.increment();

        let runner = self.clone();
        self.pool.spawn_fifo(move || {
            let _guard = PendingGuard(Arc::clone(&runner.pending));
            task(&runner);
        });
    }

    /// Block until all submitted work and its descendants have finished.
    ///
    /// The runner stays usable afterwards. Must not be called from inside a
    /// task, which would wait on itself.
    pub fn await_drain(&self) {
        self.pending.wait();
    }

    /// Wait for outstanding work, then drop this handle.
    ///
    /// Worker threads exit once every clone of the runner is gone, including
    /// those held by builders, crawlers and query runners. Until then the
    /// remaining clones can keep submitting work.
    pub fn shutdown(self) {
        self.await_drain();
        tracing::debug!(workers = self.workers, "task runner shut down");
    }

    /// Number of tasks submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("workers", &self.workers)
            .field("pending", &self.pending())
            .finish()
    }
}
