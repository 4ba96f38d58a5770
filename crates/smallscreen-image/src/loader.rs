//! Image loader
//!
//! Entry point for producers: turns a [`DecodeRequest`] plus a consumer
//! callback into a [`DecodeTask`] on the engine.

use smallscreen_tasks::{CompletionSender, TaskSubmitter};

use crate::request::{DecodeRequest, DecodedImage};
use crate::task::DecodeTask;

/// Submits decode requests to a task engine
#[derive(Debug, Clone)]
pub struct ImageLoader {
    submitter: TaskSubmitter,
    completions: CompletionSender,
}

impl ImageLoader {
    pub fn new(submitter: TaskSubmitter, completions: CompletionSender) -> Self {
        Self {
            submitter,
            completions,
        }
    }

    /// Queue a decode. `callback` runs on the consumer thread when the
    /// completion queue is drained, with either the image or an error
    /// message.
    pub fn load<F>(&self, request: DecodeRequest, callback: F)
    where
        F: FnOnce(Result<DecodedImage, String>) + Send + 'static,
    {
        tracing::debug!("Queueing decode of {}", request.source.describe());
        let handle = self.completions.handle(callback);
        self.submitter.enqueue(DecodeTask::new(request, handle));
    }

    /// Hand a decoded image back once the consumer is finished with it
    pub fn release(&self, image: DecodedImage) {
        image.release();
    }

    pub fn submitter(&self) -> &TaskSubmitter {
        &self.submitter
    }
}
