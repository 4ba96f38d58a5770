//! Decode pipeline
//!
//! Runs synchronously on whatever thread calls [`decode`]; [`DecodeTask`]
//! calls it from a worker.
//!
//! [`DecodeTask`]: crate::DecodeTask

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::channel::{Endian, to_channel_order};
use crate::error::DecodeError;
use crate::raster::{self, RgbaBitmap};
use crate::request::{DecodeRequest, DecodedImage};
use crate::resolve::resolve_by_basename;
use crate::source::ImageSource;
use crate::svg;

/// Decode a request into pixels in the requested channel order
pub fn decode(request: &DecodeRequest) -> Result<DecodedImage, DecodeError> {
    let origin = request.source.describe();
    let desired = request.desired_size();

    let bitmap = match &request.source {
        ImageSource::Markup(markup) => svg::rasterize(markup.as_bytes(), desired, &origin)?,
        ImageSource::Buffer(bytes) => decode_bytes(bytes, desired, &origin)?,
        ImageSource::Base64(text) => {
            let bytes = decode_base64(text)?;
            decode_bytes(&bytes, desired, &origin)?
        }
        ImageSource::Path(path) => {
            let path = if request.resolve_by_basename {
                resolve_path(path)
            } else {
                Cow::Borrowed(path.as_path())
            };
            let bytes = fs::read(&path).map_err(|source| DecodeError::Io {
                path: path.display().to_string(),
                source,
            })?;
            decode_bytes(&bytes, desired, &origin)?
        }
    };

    let RgbaBitmap {
        width,
        height,
        mut pixels,
    } = bitmap;
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(DecodeError::Internal(format!(
            "{} bytes for a {}x{} image from {}",
            pixels.len(),
            width,
            height,
            origin
        )));
    }

    to_channel_order(&mut pixels, request.channel_order, Endian::native());
    tracing::debug!(
        "Decoded {} -> {}x{} {}",
        origin,
        width,
        height,
        request.channel_order.name()
    );

    Ok(DecodedImage {
        width,
        height,
        pixels,
        channel_order: request.channel_order,
    })
}

/// Raster first, then vector. A raster failure is the common case for SVG
/// input, so only the vector error is reported.
fn decode_bytes(
    bytes: &[u8],
    desired: Option<(u32, u32)>,
    origin: &str,
) -> Result<RgbaBitmap, DecodeError> {
    match raster::decode(bytes) {
        Ok(bitmap) => Ok(bitmap),
        Err(reason) => {
            tracing::trace!("Raster decode of {} failed ({}), trying SVG", origin, reason);
            svg::rasterize(bytes, desired, origin)
        }
    }
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL
fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => text,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
}

fn resolve_path(path: &Path) -> Cow<'_, Path> {
    match resolve_by_basename(path) {
        Some(resolved) => Cow::Owned(resolved),
        None => Cow::Borrowed(path),
    }
}

/// Path the pipeline reads for `request`, after basename resolution
pub fn effective_path(request: &DecodeRequest) -> Option<PathBuf> {
    match &request.source {
        ImageSource::Path(path) if request.resolve_by_basename => {
            Some(resolve_path(path).into_owned())
        }
        ImageSource::Path(path) => Some(path.clone()),
        _ => None,
    }
}
