//! smallscreen Tasks
//!
//! Process-wide worker pool for CPU-bound background work.
//!
//! Producers enqueue [`Task`]s on a [`TaskEngine`] (or a [`TaskSubmitter`]
//! handle to it). Workers run each task once and report exactly once through
//! a [`CompletionSender`], and the consumer replays results on its own
//! thread by draining a [`CompletionQueue`].
//!
//! # Example
//! ```rust,no_run
//! use smallscreen_tasks::{completion_channel, EngineConfig, FnTask, TaskEngine};
//!
//! let engine = TaskEngine::new(EngineConfig::default().with_thread_pool_size(4))?;
//! let (sender, completions) = completion_channel(None);
//!
//! let handle = sender.handle(|result: Result<u64, String>| println!("{result:?}"));
//! engine.enqueue(FnTask::new("sum", || Ok((1..=100).sum()), handle));
//!
//! // Consumer run loop turn
//! completions.drain();
//! # Ok::<(), smallscreen_tasks::EngineError>(())
//! ```

mod completion;
mod config;
mod engine;
mod error;
mod pool;
pub mod queue;
mod task;

pub use completion::{Completion, CompletionHandle, CompletionQueue, CompletionSender, completion_channel};
pub use config::{ENV_COMPLETION_CAPACITY, ENV_THREAD_POOL_SIZE, EngineConfig};
pub use engine::{TaskEngine, TaskSubmitter, hardware_concurrency};
pub use error::{EngineError, TaskError};
pub use pool::{CLOSED_MESSAGE, EngineStats, PoolState, UNKNOWN_FAILURE_MESSAGE};
pub use queue::{Job, TaskQueue};
pub use task::{FnTask, Task};
