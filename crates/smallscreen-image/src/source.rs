//! Image Sources

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Longest inline source shown in messages
const DESCRIBE_LIMIT: usize = 100;

/// Where the encoded image comes from
#[derive(Clone)]
pub enum ImageSource {
    /// File on disk
    Path(PathBuf),
    /// Encoded bytes; shared so the caller can keep its copy while a worker
    /// reads this one
    Buffer(Arc<[u8]>),
    /// Inline SVG markup
    Markup(String),
    /// Base64 text, optionally as a `data:` URL
    Base64(String),
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn buffer(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Buffer(bytes.into())
    }

    pub fn markup(markup: impl Into<String>) -> Self {
        Self::Markup(markup.into())
    }

    pub fn base64(text: impl Into<String>) -> Self {
        Self::Base64(text.into())
    }

    /// Short human-readable form used in logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Buffer(bytes) => format!("buffer://{} bytes", bytes.len()),
            Self::Markup(markup) => format!("xml://{}", truncate(markup)),
            Self::Base64(text) => format!("base64://{}", truncate(text)),
        }
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(DESCRIBE_LIMIT) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageSource").field(&self.describe()).finish()
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes.into())
    }
}

impl From<Arc<[u8]>> for ImageSource {
    fn from(bytes: Arc<[u8]>) -> Self {
        Self::Buffer(bytes)
    }
}
