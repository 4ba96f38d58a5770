//! Worker pool lifecycle and delivery guarantees
//!
//! Every test drives the engine from the test thread, which doubles as the
//! consumer context draining the completion queue.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use smallscreen_tasks::*;

// ============================================================================
// TEST TASKS
// ============================================================================

#[derive(Default)]
struct Counters {
    runs: AtomicUsize,
    dispatches: AtomicUsize,
    errors: AtomicUsize,
}

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
    Sleep(Duration),
}

struct TrackedTask {
    id: usize,
    behavior: Behavior,
    counters: Arc<Counters>,
    handle: CompletionHandle<usize>,
}

impl Task for TrackedTask {
    fn run(&mut self) -> Result<(), TaskError> {
        self.counters.runs.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(TaskError::new(format!("task {} failed", self.id))),
            Behavior::Panic => panic!("task {} exploded", self.id),
            Behavior::Sleep(duration) => {
                thread::sleep(duration);
                Ok(())
            }
        }
    }

    fn dispatch(self: Box<Self>) {
        self.counters.dispatches.fetch_add(1, Ordering::SeqCst);
        self.handle.complete(self.id);
    }

    fn dispatch_error(self: Box<Self>, message: String) {
        self.counters.errors.fetch_add(1, Ordering::SeqCst);
        self.handle.fail(message);
    }
}

type Outcomes = Arc<Mutex<Vec<Result<usize, String>>>>;

struct Harness {
    sender: CompletionSender,
    queue: CompletionQueue,
    counters: Arc<Counters>,
    outcomes: Outcomes,
}

impl Harness {
    fn new() -> Self {
        Self::with_capacity(None)
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        let (sender, queue) = completion_channel(capacity);
        Self {
            sender,
            queue,
            counters: Arc::new(Counters::default()),
            outcomes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn task(&self, id: usize, behavior: Behavior) -> TrackedTask {
        let outcomes = Arc::clone(&self.outcomes);
        TrackedTask {
            id,
            behavior,
            counters: Arc::clone(&self.counters),
            handle: self
                .sender
                .handle(move |result| outcomes.lock().unwrap().push(result)),
        }
    }

    /// Drain completions until `expected` have been replayed or time runs out
    fn collect(&self, expected: usize) -> Vec<Result<usize, String>> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while self.outcomes.lock().unwrap().len() < expected && Instant::now() < deadline {
            self.queue.run_next_timeout(Duration::from_millis(20));
        }
        self.queue.drain();
        self.outcomes.lock().unwrap().clone()
    }
}

fn engine(size: usize) -> TaskEngine {
    TaskEngine::new(EngineConfig::default().with_thread_pool_size(size)).unwrap()
}

// ============================================================================
// DELIVERY
// ============================================================================

#[test]
fn test_each_task_runs_once_and_reports_once() {
    let harness = Harness::new();
    let engine = engine(3);

    for id in 0..50 {
        let behavior = if id % 5 == 0 { Behavior::Fail } else { Behavior::Succeed };
        engine.enqueue(harness.task(id, behavior));
    }

    let outcomes = harness.collect(50);
    assert_eq!(outcomes.len(), 50);
    assert_eq!(harness.counters.runs.load(Ordering::SeqCst), 50);
    assert_eq!(harness.counters.dispatches.load(Ordering::SeqCst), 40);
    assert_eq!(harness.counters.errors.load(Ordering::SeqCst), 10);

    let failures: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(failures.len(), 10);
    assert!(failures.iter().all(|m| m.ends_with("failed")));
}

#[test]
fn test_thousand_tasks_on_four_workers() {
    let harness = Harness::new();
    let engine = engine(4);
    let submitter = engine.submitter();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let submitter = submitter.clone();
            let tasks: Vec<_> = (0..250)
                .map(|i| harness.task(p * 250 + i, Behavior::Succeed))
                .collect();
            thread::spawn(move || {
                for task in tasks {
                    submitter.enqueue(task);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let outcomes = harness.collect(1000);
    assert_eq!(outcomes.len(), 1000);

    let ids: HashSet<usize> = outcomes.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(ids.len(), 1000);
    assert_eq!(harness.counters.runs.load(Ordering::SeqCst), 1000);
}

#[test]
fn test_completions_replayed_on_consumer_thread() {
    let (sender, queue) = completion_channel(None);
    let engine = engine(2);
    let consumer = thread::current().id();
    let on_consumer = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let on_consumer = Arc::clone(&on_consumer);
        let handle = sender.handle(move |_: Result<(), String>| {
            if thread::current().id() == consumer {
                on_consumer.fetch_add(1, Ordering::SeqCst);
            }
        });
        engine.enqueue(FnTask::new("noop", || Ok(()), handle));
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    while on_consumer.load(Ordering::SeqCst) < 8 && Instant::now() < deadline {
        queue.run_next_timeout(Duration::from_millis(20));
    }
    assert_eq!(on_consumer.load(Ordering::SeqCst), 8);
}

// ============================================================================
// FAILURE ISOLATION
// ============================================================================

#[test]
fn test_worker_survives_failed_task() {
    let harness = Harness::new();
    let engine = engine(1);

    engine.enqueue(harness.task(0, Behavior::Fail));
    engine.enqueue(harness.task(1, Behavior::Succeed));
    engine.enqueue(harness.task(2, Behavior::Fail));
    engine.enqueue(harness.task(3, Behavior::Succeed));

    let outcomes = harness.collect(4);
    assert_eq!(outcomes.len(), 4);
    assert_eq!(engine.thread_pool_size(), 1);
    assert_eq!(harness.counters.dispatches.load(Ordering::SeqCst), 2);
}

#[test]
fn test_worker_survives_panicking_task() {
    let harness = Harness::new();
    let engine = engine(1);
    let worker = engine.worker_ids();

    engine.enqueue(harness.task(0, Behavior::Panic));
    engine.enqueue(harness.task(1, Behavior::Succeed));

    let outcomes = harness.collect(2);
    assert_eq!(outcomes.len(), 2);
    let error = outcomes[0].as_ref().unwrap_err();
    assert!(error.starts_with(UNKNOWN_FAILURE_MESSAGE), "got {error}");
    assert_eq!(outcomes[1], Ok(1));

    assert_eq!(engine.worker_ids(), worker);
    assert_eq!(engine.stats().failed, 1);
    assert_eq!(engine.stats().completed, 1);
}

// ============================================================================
// POOL SIZE
// ============================================================================

#[test]
fn test_set_size_then_get_size() {
    let mut engine = engine(1);
    for size in [3, 1, 5, 2] {
        engine.set_thread_pool_size(size).unwrap();
        assert_eq!(engine.thread_pool_size(), size);
        assert_eq!(engine.submitter().thread_pool_size(), size);
        assert_eq!(engine.state(), PoolState::Running(size));
    }

    engine.set_thread_pool_size(0).unwrap();
    assert_eq!(engine.thread_pool_size(), hardware_concurrency());
}

#[test]
fn test_same_size_keeps_workers() {
    let mut engine = engine(3);
    let before: HashSet<_> = engine.worker_ids().into_iter().collect();

    engine.set_thread_pool_size(3).unwrap();

    let after: HashSet<_> = engine.worker_ids().into_iter().collect();
    assert_eq!(before, after);
}

#[test]
fn test_resize_replaces_workers() {
    let mut engine = engine(2);
    let before: HashSet<_> = engine.worker_ids().into_iter().collect();

    engine.set_thread_pool_size(4).unwrap();

    let after: HashSet<_> = engine.worker_ids().into_iter().collect();
    assert_eq!(after.len(), 4);
    assert!(before.is_disjoint(&after));
}

#[test]
fn test_resize_loses_no_tasks() {
    let harness = Harness::new();
    let mut engine = engine(2);

    for id in 0..20 {
        engine.enqueue(harness.task(id, Behavior::Sleep(Duration::from_millis(2))));
    }
    engine.set_thread_pool_size(3).unwrap();
    for id in 20..40 {
        engine.enqueue(harness.task(id, Behavior::Succeed));
    }
    engine.set_thread_pool_size(1).unwrap();

    let outcomes = harness.collect(40);
    assert_eq!(outcomes.len(), 40);
    assert!(outcomes.iter().all(|r| r.is_ok()));
}

// ============================================================================
// CLOSE
// ============================================================================

#[test]
fn test_close_reports_every_queued_task() {
    let harness = Harness::new();
    let mut engine = engine(1);

    engine.enqueue(harness.task(0, Behavior::Sleep(Duration::from_millis(50))));
    for id in 1..20 {
        engine.enqueue(harness.task(id, Behavior::Succeed));
    }
    engine.close();

    assert_eq!(engine.thread_pool_size(), 0);
    assert_eq!(engine.state(), PoolState::Closed);

    let outcomes = harness.collect(20);
    assert_eq!(outcomes.len(), 20);
    let reported = harness.counters.dispatches.load(Ordering::SeqCst)
        + harness.counters.errors.load(Ordering::SeqCst);
    assert_eq!(reported, 20);
    assert!(
        outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|m| m == CLOSED_MESSAGE)
    );
}

#[test]
fn test_close_with_full_bounded_completion_channel() {
    let harness = Harness::with_capacity(Some(1));
    let mut engine = engine(1);

    for id in 0..3 {
        engine.enqueue(harness.task(id, Behavior::Succeed));
    }
    let deadline = Instant::now() + Duration::from_secs(10);
    while harness.counters.dispatches.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    // channel is over capacity and nobody drains while closing
    engine.enqueue(harness.task(3, Behavior::Sleep(Duration::from_millis(20))));
    engine.enqueue(harness.task(4, Behavior::Succeed));

    let (done_tx, done_rx) = mpsc::channel();
    let closer = thread::spawn(move || {
        engine.close();
        done_tx.send(engine.thread_pool_size()).unwrap();
    });
    let size = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("close did not return");
    closer.join().unwrap();
    assert_eq!(size, 0);

    let outcomes = harness.collect(5);
    assert_eq!(outcomes.len(), 5);
    let reported = harness.counters.dispatches.load(Ordering::SeqCst)
        + harness.counters.errors.load(Ordering::SeqCst);
    assert_eq!(reported, 5);
}

#[test]
fn test_enqueue_after_close_is_rejected() {
    let harness = Harness::new();
    let mut engine = engine(2);
    let submitter = engine.submitter();
    engine.close();

    submitter.enqueue(harness.task(7, Behavior::Succeed));

    let outcomes = harness.collect(1);
    assert_eq!(outcomes, vec![Err(CLOSED_MESSAGE.to_string())]);
    assert_eq!(harness.counters.runs.load(Ordering::SeqCst), 0);
    assert!(submitter.is_closed());
}

#[test]
fn test_drop_closes_engine() {
    let harness = Harness::new();
    let submitter = {
        let engine = engine(2);
        engine.submitter()
    };

    assert!(submitter.is_closed());
    assert_eq!(submitter.thread_pool_size(), 0);
    submitter.enqueue(harness.task(1, Behavior::Succeed));
    assert_eq!(harness.collect(1).len(), 1);
}
