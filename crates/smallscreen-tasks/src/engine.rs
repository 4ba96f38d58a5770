//! Task Engine
//!
//! Service object owning the task queue and the worker pool. One engine is
//! built per process and producers get [`TaskSubmitter`] handles to it.
//!
//! Resizing and closing take `&mut self`, so they can never race each other.

use std::sync::Arc;
use std::thread::ThreadId;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pool::{EngineStats, PoolState, Shared, WorkerPool};
use crate::task::Task;

/// Worker pool plus task queue
#[derive(Debug)]
pub struct TaskEngine {
    shared: Arc<Shared>,
    pool: WorkerPool,
}

impl TaskEngine {
    /// Create the engine and start `config.thread_pool_size` workers
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self {
            shared: Arc::new(Shared::new()),
            pool: WorkerPool::new(config.thread_name_prefix),
        };
        engine.set_thread_pool_size(config.thread_pool_size)?;
        Ok(engine)
    }

    /// Resize the pool to `size` workers (0 = hardware concurrency).
    ///
    /// Same size is a no-op that keeps the current threads. Any other size
    /// drains every current worker before spawning the new set; tasks queued
    /// behind the sentinels run on the new workers.
    pub fn set_thread_pool_size(&mut self, size: usize) -> Result<(), EngineError> {
        if !self.shared.is_running() {
            return Err(EngineError::Closed);
        }

        let size = if size == 0 { hardware_concurrency() } else { size };
        if self.pool.len() == size {
            return Ok(());
        }

        tracing::info!("Resizing worker pool {} -> {}", self.pool.len(), size);
        self.shared.set_state(PoolState::Draining);
        self.pool.drain(&self.shared);

        let spawned = self.pool.spawn(&self.shared, size);
        self.shared.set_state(match self.pool.len() {
            0 => PoolState::Stopped,
            n => PoolState::Running(n),
        });
        spawned
    }

    /// Number of live workers
    pub fn thread_pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Queue a task for execution
    pub fn enqueue<T: Task>(&self, task: T) {
        self.shared.submit(Box::new(task));
    }

    /// Queue an already boxed task
    pub fn enqueue_boxed(&self, task: Box<dyn Task>) {
        self.shared.submit(task);
    }

    /// Producer handle usable from any thread
    pub fn submitter(&self) -> TaskSubmitter {
        TaskSubmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drain and disable the pool for good. Idempotent.
    ///
    /// In-flight tasks finish and report normally. Tasks still queued, and
    /// tasks submitted afterwards, each get one `dispatch_error`.
    pub fn close(&mut self) {
        let was_running = self.shared.is_running();
        self.shared.stop_running();
        if was_running {
            tracing::info!("Closing task engine");
            self.shared.set_state(PoolState::Draining);
        }

        self.pool.drain(&self.shared);

        let pending = self.shared.queue.close();
        if !pending.is_empty() {
            tracing::debug!("Rejecting {} queued task(s) on close", pending.len());
        }
        for task in pending {
            self.shared.reject(task);
        }
        self.shared.set_state(PoolState::Closed);
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.is_running()
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    pub fn stats(&self) -> EngineStats {
        self.shared.stats()
    }

    /// Thread ids of the current worker generation
    pub fn worker_ids(&self) -> Vec<ThreadId> {
        self.pool.thread_ids()
    }
}

impl Drop for TaskEngine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cloneable producer handle to a [`TaskEngine`]
#[derive(Debug, Clone)]
pub struct TaskSubmitter {
    shared: Arc<Shared>,
}

impl TaskSubmitter {
    /// Queue a task for execution. Never blocks on queue depth.
    pub fn enqueue<T: Task>(&self, task: T) {
        self.shared.submit(Box::new(task));
    }

    pub fn enqueue_boxed(&self, task: Box<dyn Task>) {
        self.shared.submit(task);
    }

    pub fn thread_pool_size(&self) -> usize {
        self.shared.worker_count()
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.is_running()
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    pub fn stats(&self) -> EngineStats {
        self.shared.stats()
    }
}

/// Platform concurrency hint, 1 if unavailable
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
