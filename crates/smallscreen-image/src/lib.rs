//! smallscreen Image - Off-thread Image Decoding
//!
//! Decodes PNG, JPEG, GIF, WebP, BMP and SVG sources into packed 32-bit
//! pixel buffers on the task engine's worker pool.
//!
//! # Example
//! ```rust,no_run
//! use smallscreen_image::{ChannelOrder, DecodeRequest, ImageLoader};
//! use smallscreen_tasks::{completion_channel, EngineConfig, TaskEngine};
//!
//! let engine = TaskEngine::new(EngineConfig::default())?;
//! let (sender, completions) = completion_channel(None);
//! let loader = ImageLoader::new(engine.submitter(), sender);
//!
//! let request = DecodeRequest::new(std::path::PathBuf::from("logo.png"))
//!     .with_channel_order(ChannelOrder::Bgra);
//! loader.load(request, |result| match result {
//!     Ok(image) => println!("{}x{}", image.width, image.height),
//!     Err(message) => eprintln!("{message}"),
//! });
//!
//! completions.drain();
//! # Ok::<(), smallscreen_tasks::EngineError>(())
//! ```

mod channel;
mod error;
mod loader;
mod pipeline;
mod raster;
mod request;
mod resolve;
mod source;
pub mod svg;
mod task;

pub use channel::{ChannelOrder, Endian, from_channel_order, to_channel_order};
pub use error::DecodeError;
pub use loader::ImageLoader;
pub use pipeline::{decode, effective_path};
pub use raster::ImageFormat;
pub use request::{DecodeRequest, DecodedImage};
pub use resolve::resolve_by_basename;
pub use source::ImageSource;
pub use task::DecodeTask;
