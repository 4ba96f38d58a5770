//! Decode errors

use smallscreen_tasks::TaskError;

/// Reasons a decode request can fail
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Neither the raster nor the vector decoder accepted the data
    #[error("Failed to load image {origin}: {reason}")]
    Decode { origin: String, reason: String },

    /// Vector source without intrinsic size and no size requested
    #[error("SVG has no dimensions: {0}")]
    MissingDimensions(String),

    #[error("Failed to allocate {width}x{height} surface for {origin}")]
    Allocation {
        origin: String,
        width: u32,
        height: u32,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Internal decode error: {0}")]
    Internal(String),
}

impl DecodeError {
    pub(crate) fn decode(origin: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            origin: origin.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<DecodeError> for TaskError {
    fn from(err: DecodeError) -> Self {
        TaskError::new(err.to_string())
    }
}
