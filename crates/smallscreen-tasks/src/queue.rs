//! Task Queue
//!
//! Unbounded multi-producer/multi-consumer queue of pending tasks. Stop
//! sentinels share the queue with real work so that each one retires exactly
//! one worker after everything enqueued ahead of it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::task::Task;

/// Entry popped by a worker
pub enum Job {
    /// A task to run
    Task(Box<dyn Task>),
    /// Sentinel: the receiving worker exits its loop
    Stop,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(task) => f.debug_tuple("Task").field(&task.label()).finish(),
            Self::Stop => f.write_str("Stop"),
        }
    }
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Blocking task queue
#[derive(Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Tasks never run under this lock, so a poisoned guard still holds a
    // consistent deque.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task and wake one waiting worker. Never blocks on capacity.
    ///
    /// Once the queue is closed the task is handed back to the caller.
    pub fn enqueue(&self, task: Box<dyn Task>) -> Result<(), Box<dyn Task>> {
        let mut state = self.lock();
        if state.closed {
            return Err(task);
        }
        state.jobs.push_back(Job::Task(task));
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Queue `count` stop sentinels behind all current work
    pub fn enqueue_stops(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut state = self.lock();
        state.jobs.extend((0..count).map(|_| Job::Stop));
        drop(state);
        self.available.notify_all();
    }

    /// Block until a job is available
    pub fn dequeue_blocking(&self) -> Job {
        let mut state = self.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return job;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Pop a job without waiting
    pub fn try_dequeue(&self) -> Option<Job> {
        self.lock().jobs.pop_front()
    }

    /// Remove stop sentinels nobody consumed
    pub fn purge_stops(&self) -> usize {
        let mut state = self.lock();
        let before = state.jobs.len();
        state.jobs.retain(|job| matches!(job, Job::Task(_)));
        before - state.jobs.len()
    }

    /// Refuse further tasks and hand back everything still pending
    pub fn close(&self) -> Vec<Box<dyn Task>> {
        let mut state = self.lock();
        state.closed = true;
        let pending = state
            .jobs
            .drain(..)
            .filter_map(|job| match job {
                Job::Task(task) => Some(task),
                Job::Stop => None,
            })
            .collect();
        pending
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending tasks, sentinels excluded
    pub fn len(&self) -> usize {
        self.lock()
            .jobs
            .iter()
            .filter(|job| matches!(job, Job::Task(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (jobs, closed) = {
            let state = self.lock();
            (state.jobs.len(), state.closed)
        };
        f.debug_struct("TaskQueue")
            .field("jobs", &jobs)
            .field("closed", &closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Noop;

    impl Task for Noop {
        fn run(&mut self) -> Result<(), TaskError> {
            Ok(())
        }
        fn dispatch(self: Box<Self>) {}
        fn dispatch_error(self: Box<Self>, _message: String) {}
    }

    #[test]
    fn test_fifo_with_sentinels() {
        let queue = TaskQueue::new();
        queue.enqueue(Box::new(Noop)).ok().unwrap();
        queue.enqueue_stops(1);
        queue.enqueue(Box::new(Noop)).ok().unwrap();

        assert_eq!(queue.len(), 2);
        assert!(matches!(queue.dequeue_blocking(), Job::Task(_)));
        assert!(matches!(queue.dequeue_blocking(), Job::Stop));
        assert!(matches!(queue.dequeue_blocking(), Job::Task(_)));
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let queue = Arc::new(TaskQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || matches!(queue.dequeue_blocking(), Job::Stop))
        };

        thread::sleep(Duration::from_millis(20));
        queue.enqueue_stops(1);

        assert!(consumer.join().unwrap());
    }

    #[test]
    fn test_close_returns_pending_and_rejects() {
        let queue = TaskQueue::new();
        queue.enqueue(Box::new(Noop)).ok().unwrap();
        queue.enqueue_stops(2);
        queue.enqueue(Box::new(Noop)).ok().unwrap();

        let pending = queue.close();
        assert_eq!(pending.len(), 2);
        assert!(queue.is_closed());
        assert!(queue.is_empty());
        assert!(queue.enqueue(Box::new(Noop)).is_err());
    }

    #[test]
    fn test_purge_stops() {
        let queue = TaskQueue::new();
        queue.enqueue_stops(3);
        queue.enqueue(Box::new(Noop)).ok().unwrap();

        assert_eq!(queue.purge_stops(), 3);
        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.try_dequeue(), Some(Job::Task(_))));
    }
}
