//! Decode task

use std::borrow::Cow;
use std::fmt;

use smallscreen_tasks::{CompletionHandle, Task, TaskError};

use crate::pipeline;
use crate::request::{DecodeRequest, DecodedImage};

/// Decodes one [`DecodeRequest`] on a worker and reports through its
/// completion handle
pub struct DecodeTask {
    request: DecodeRequest,
    result: Option<DecodedImage>,
    handle: CompletionHandle<DecodedImage>,
}

impl DecodeTask {
    pub fn new(request: DecodeRequest, handle: CompletionHandle<DecodedImage>) -> Self {
        Self {
            request,
            result: None,
            handle,
        }
    }

    pub fn request(&self) -> &DecodeRequest {
        &self.request
    }
}

impl Task for DecodeTask {
    fn run(&mut self) -> Result<(), TaskError> {
        self.result = Some(pipeline::decode(&self.request)?);
        Ok(())
    }

    fn dispatch(self: Box<Self>) {
        let DecodeTask { result, handle, .. } = *self;
        match result {
            Some(image) => handle.complete(image),
            None => handle.fail("Decode finished without an image."),
        };
    }

    fn dispatch_error(self: Box<Self>, message: String) {
        tracing::debug!("Reporting decode failure for {}", self.request.source.describe());
        self.handle.fail(message);
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("decode {}", self.request.source.describe()))
    }
}

impl fmt::Debug for DecodeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeTask")
            .field("request", &self.request)
            .field("decoded", &self.result.is_some())
            .finish()
    }
}
