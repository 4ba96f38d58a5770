//! Worker Pool
//!
//! Fixed-size set of OS threads running the dequeue, execute, report loop.
//! Resizing is a full drain and respawn: one stop sentinel per live worker,
//! join them all, then start the new generation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::EngineError;
use crate::queue::{Job, TaskQueue};
use crate::task::Task;

/// Message delivered for tasks that never got to run because of `close`
pub const CLOSED_MESSAGE: &str = "Task queue is closed.";

/// Message delivered when `run` panics without a readable payload
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown async worker exception.";

/// Lifecycle state of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// No workers
    Stopped,
    /// Workers executing the loop
    Running(usize),
    /// Sentinels injected, waiting for workers to exit
    Draining,
    /// Closed for good
    Closed,
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Tasks waiting in the queue
    pub pending: usize,
    /// Tasks currently inside `run` or a dispatch call
    pub active: usize,
    /// Tasks that reported through `dispatch`
    pub completed: u64,
    /// Tasks that reported through `dispatch_error`
    pub failed: u64,
    /// Live worker threads
    pub workers: usize,
}

/// State shared between the engine, submitters and workers
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) queue: TaskQueue,
    running: AtomicBool,
    state: Mutex<PoolState>,
    workers: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            running: AtomicBool::new(true),
            state: Mutex::new(PoolState::Stopped),
            workers: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn stop_running(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub(crate) fn state(&self) -> PoolState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, next: PoolState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            tracing::debug!("Worker pool {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.load(Ordering::Acquire)
    }

    /// Enqueue, or reject right away once the queue is closed
    pub(crate) fn submit(&self, task: Box<dyn Task>) {
        tracing::debug!("Enqueue task {}", task.label());
        if let Err(task) = self.queue.enqueue(task) {
            tracing::debug!("Rejecting task {} after close", task.label());
            self.reject(task);
        }
    }

    pub(crate) fn reject(&self, task: Box<dyn Task>) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        report(move || task.dispatch_error(CLOSED_MESSAGE.to_string()));
    }

    pub(crate) fn stats(&self) -> EngineStats {
        EngineStats {
            pending: self.queue.len(),
            active: self.active.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            workers: self.worker_count(),
        }
    }
}

/// A single pool thread
#[derive(Debug)]
struct Worker {
    id: usize,
    thread: JoinHandle<()>,
}

/// Collection of worker threads of the current generation
#[derive(Debug)]
pub(crate) struct WorkerPool {
    workers: Vec<Worker>,
    generation: u64,
    name_prefix: String,
}

impl WorkerPool {
    pub(crate) fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            workers: Vec::new(),
            generation: 0,
            name_prefix: name_prefix.into(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn thread_ids(&self) -> Vec<ThreadId> {
        self.workers.iter().map(|w| w.thread.thread().id()).collect()
    }

    /// Start `count` workers as a new generation.
    ///
    /// On a spawn failure the workers started so far keep running and the
    /// error is returned.
    pub(crate) fn spawn(&mut self, shared: &Arc<Shared>, count: usize) -> Result<(), EngineError> {
        self.generation += 1;
        for id in 0..count {
            let name = format!("{}-{}-{}", self.name_prefix, self.generation, id);
            let worker_shared = Arc::clone(shared);
            let spawned = thread::Builder::new()
                .name(name)
                .spawn(move || worker_loop(&worker_shared));

            match spawned {
                Ok(thread) => {
                    self.workers.push(Worker { id, thread });
                    shared.workers.store(self.workers.len(), Ordering::Release);
                }
                Err(err) => {
                    tracing::warn!("Failed to spawn worker {}: {}", id, err);
                    return Err(EngineError::Spawn(err));
                }
            }
        }
        tracing::info!(
            "Started {} worker(s), generation {}",
            self.workers.len(),
            self.generation
        );
        Ok(())
    }

    /// Retire every worker: one sentinel each, then join them all
    pub(crate) fn drain(&mut self, shared: &Shared) {
        if self.workers.is_empty() {
            return;
        }

        shared.queue.enqueue_stops(self.workers.len());
        for worker in self.workers.drain(..) {
            if worker.thread.join().is_err() {
                tracing::warn!("Worker {} exited by panic", worker.id);
            }
        }
        shared.workers.store(0, Ordering::Release);

        // A worker that left early never consumed its sentinel; it must not
        // retire a member of the next generation.
        let stale = shared.queue.purge_stops();
        if stale > 0 {
            tracing::debug!("Purged {} unconsumed stop sentinel(s)", stale);
        }
    }
}

/// Body of each worker thread.
///
/// Only a stop sentinel or a cleared liveness flag ends the loop; task
/// failures and panics are reported and the loop continues.
fn worker_loop(shared: &Shared) {
    while shared.is_running() {
        let task = match shared.queue.dequeue_blocking() {
            Job::Task(task) => task,
            Job::Stop => break,
        };

        if !shared.is_running() {
            shared.reject(task);
            break;
        }

        execute(shared, task);
    }
    tracing::debug!("Worker {:?} exiting", thread::current().name());
}

fn execute(shared: &Shared, mut task: Box<dyn Task>) {
    shared.active.fetch_add(1, Ordering::AcqRel);
    tracing::debug!("Running task {}", task.label());

    match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
        Ok(Ok(())) => {
            shared.completed.fetch_add(1, Ordering::Relaxed);
            report(move || task.dispatch());
        }
        Ok(Err(err)) => {
            tracing::warn!("Task {} failed: {}", task.label(), err);
            shared.failed.fetch_add(1, Ordering::Relaxed);
            report(move || task.dispatch_error(err.into_message()));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Task {} panicked: {}", task.label(), message);
            shared.failed.fetch_add(1, Ordering::Relaxed);
            report(move || task.dispatch_error(message));
        }
    }

    shared.active.fetch_sub(1, Ordering::AcqRel);
}

// A panicking dispatch has already consumed the task, so it is only logged.
fn report(dispatch: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(dispatch)).is_err() {
        tracing::warn!("Task dispatch panicked; completion lost");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("{UNKNOWN_FAILURE_MESSAGE} {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("{UNKNOWN_FAILURE_MESSAGE} {message}")
    } else {
        UNKNOWN_FAILURE_MESSAGE.to_string()
    }
}
