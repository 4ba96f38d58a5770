//! Decode requests and results

use std::fmt;

use crate::channel::ChannelOrder;
use crate::source::ImageSource;

/// Everything a decode task needs, captured by value
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    /// Encoded input
    pub source: ImageSource,
    /// Desired width (0 = intrinsic)
    pub width: u32,
    /// Desired height (0 = intrinsic)
    pub height: u32,
    /// Output byte layout
    pub channel_order: ChannelOrder,
    /// Search the source directory for a file whose name starts with the
    /// requested file name
    pub resolve_by_basename: bool,
}

impl DecodeRequest {
    pub fn new(source: impl Into<ImageSource>) -> Self {
        Self {
            source: source.into(),
            width: 0,
            height: 0,
            channel_order: ChannelOrder::default(),
            resolve_by_basename: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    pub fn with_resolve_by_basename(mut self, resolve: bool) -> Self {
        self.resolve_by_basename = resolve;
        self
    }

    /// Requested size, only when both dimensions were given
    pub fn desired_size(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }
}

/// A decoded image ready for texture upload
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// `width * height * 4` bytes, premultiplied, in `channel_order`
    pub pixels: Vec<u8>,
    /// Byte layout of `pixels`
    pub channel_order: ChannelOrder,
}

impl DecodedImage {
    /// Memory size in bytes
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Raw bytes of the pixel at (x, y), in `channel_order`
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(idx..idx + 4)?.try_into().ok()
    }

    /// Give the pixel buffer back once the consumer is done with it
    pub fn release(self) {
        tracing::trace!("Releasing {}x{} image ({} bytes)", self.width, self.height, self.pixels.len());
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("channel_order", &self.channel_order)
            .finish()
    }
}
