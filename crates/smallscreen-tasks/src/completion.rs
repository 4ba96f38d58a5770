//! Completion Channel
//!
//! Workers never call back into the consumer directly. They post boxed
//! completions into a channel and the consumer replays them on its own turn
//! by draining the [`CompletionQueue`] from its run loop.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

/// A completion replayed on the consumer context
pub type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Completions that did not fit into a full bounded channel
type Overflow = Arc<Mutex<VecDeque<Completion>>>;

/// Create a connected sender/queue pair.
///
/// `None` gives an unbounded channel. With `Some(capacity)` the channel holds
/// `capacity` completions; posts beyond that spill into an overflow list the
/// consumer drains after the channel. Posting never blocks, so a worker can
/// always be joined while the consumer is not draining.
pub fn completion_channel(capacity: Option<usize>) -> (CompletionSender, CompletionQueue) {
    let (tx, rx) = match capacity {
        Some(capacity) => crossbeam_channel::bounded(capacity),
        None => crossbeam_channel::unbounded(),
    };
    let overflow = Overflow::default();
    (
        CompletionSender {
            tx,
            overflow: Arc::clone(&overflow),
        },
        CompletionQueue { rx, overflow },
    )
}

/// Producer side of the completion channel, held by tasks
#[derive(Clone)]
pub struct CompletionSender {
    tx: Sender<Completion>,
    overflow: Overflow,
}

impl CompletionSender {
    /// Post a completion for the consumer. Returns false if the consumer
    /// side is gone, in which case the completion is dropped.
    pub fn post<F>(&self, completion: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.tx.try_send(Box::new(completion)) {
            Ok(()) => true,
            Err(TrySendError::Full(completion)) => {
                let mut overflow = self.overflow.lock().unwrap_or_else(PoisonError::into_inner);
                overflow.push_back(completion);
                tracing::debug!("Completion channel full, {} spilled", overflow.len());
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("Completion queue disconnected, dropping completion");
                false
            }
        }
    }

    /// Bind a consumer callback to this channel
    pub fn handle<T, F>(&self, callback: F) -> CompletionHandle<T>
    where
        F: FnOnce(Result<T, String>) + Send + 'static,
    {
        CompletionHandle {
            sender: self.clone(),
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for CompletionSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSender")
            .field("queued", &self.tx.len())
            .finish_non_exhaustive()
    }
}

/// Consumer side of the completion channel
pub struct CompletionQueue {
    rx: Receiver<Completion>,
    overflow: Overflow,
}

impl CompletionQueue {
    /// Run every completion queued at the time of the call on the calling
    /// thread. Completions arriving meanwhile wait for the next drain.
    pub fn drain(&self) -> usize {
        let queued = self.pending();
        let mut ran = 0;
        while ran < queued {
            let Some(completion) = self.try_next() else { break };
            completion();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one completion and run it.
    pub fn run_next_timeout(&self, timeout: Duration) -> bool {
        let next = match self.try_next() {
            Some(completion) => Some(completion),
            // A spill only happens into a full channel, so an empty channel
            // here means waiting on it is enough.
            None => match self.rx.recv_timeout(timeout) {
                Ok(completion) => Some(completion),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            },
        };
        match next {
            Some(completion) => {
                completion();
                true
            }
            None => false,
        }
    }

    /// Completions waiting to be replayed
    pub fn pending(&self) -> usize {
        self.rx.len() + self.overflow_len()
    }

    /// Channel first, then the spill list
    fn try_next(&self) -> Option<Completion> {
        if let Ok(completion) = self.rx.try_recv() {
            return Some(completion);
        }
        self.overflow
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn overflow_len(&self) -> usize {
        self.overflow.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

/// One-shot result delivery for a single task.
///
/// Either `complete` or `fail` consumes the handle, so the consumer gets
/// exactly one of data or error.
pub struct CompletionHandle<T> {
    sender: CompletionSender,
    callback: Box<dyn FnOnce(Result<T, String>) + Send + 'static>,
}

impl<T: Send + 'static> CompletionHandle<T> {
    pub fn complete(self, value: T) -> bool {
        self.deliver(Ok(value))
    }

    pub fn fail(self, message: impl Into<String>) -> bool {
        self.deliver(Err(message.into()))
    }

    fn deliver(self, result: Result<T, String>) -> bool {
        let callback = self.callback;
        self.sender.post(move || callback(result))
    }
}

impl<T> fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle").finish_non_exhaustive()
    }
}
