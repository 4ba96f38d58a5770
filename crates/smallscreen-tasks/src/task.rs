//! Task Contract
//!
//! A task is run once on a worker thread and then reports exactly once,
//! either through `dispatch` or `dispatch_error`. Both report methods
//! consume the task, so a second report cannot be expressed.

use std::borrow::Cow;

use crate::completion::CompletionHandle;
use crate::error::TaskError;

/// A unit of deferred work executed by the engine's worker pool
pub trait Task: Send + 'static {
    /// Perform the work on the worker thread.
    ///
    /// Must not touch consumer-only resources. A returned error is turned
    /// into a single `dispatch_error` call by the worker.
    fn run(&mut self) -> Result<(), TaskError>;

    /// Deliver the result of a successful `run`.
    fn dispatch(self: Box<Self>);

    /// Deliver a failure instead of a result.
    fn dispatch_error(self: Box<Self>, message: String);

    /// Short description for log output
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

/// Task built from a closure whose output goes to a [`CompletionHandle`]
pub struct FnTask<T, F> {
    label: &'static str,
    work: Option<F>,
    output: Option<T>,
    handle: CompletionHandle<T>,
}

impl<T, F> FnTask<T, F>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
{
    pub fn new(label: &'static str, work: F, handle: CompletionHandle<T>) -> Self {
        Self {
            label,
            work: Some(work),
            output: None,
            handle,
        }
    }
}

impl<T, F> Task for FnTask<T, F>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
{
    fn run(&mut self) -> Result<(), TaskError> {
        let work = self
            .work
            .take()
            .ok_or_else(|| TaskError::new("Task has already run."))?;
        self.output = Some(work()?);
        Ok(())
    }

    fn dispatch(self: Box<Self>) {
        let FnTask { output, handle, .. } = *self;
        match output {
            Some(output) => handle.complete(output),
            None => handle.fail("Task finished without output."),
        };
    }

    fn dispatch_error(self: Box<Self>, message: String) {
        self.handle.fail(message);
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.label)
    }
}

impl<T, F> std::fmt::Debug for FnTask<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask")
            .field("label", &self.label)
            .field("ran", &self.work.is_none())
            .finish()
    }
}
