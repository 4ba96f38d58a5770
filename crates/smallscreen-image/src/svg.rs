//! SVG Image Support
//!
//! Parsing, sizing and rasterizing are done by usvg/resvg into a tiny-skia
//! pixmap. The root start tag is only checked beforehand for what usvg would
//! paper over: negative dimensions and a scene that declares no size at all.

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::DecodeError;
use crate::raster::RgbaBitmap;

/// Size information declared on the root `<svg>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RootSize {
    /// Both `width` and `height` are given as non-percentage lengths
    pub absolute: bool,
    /// A `viewBox` is present
    pub view_box: bool,
}

impl RootSize {
    /// Whether the scene has an intrinsic size of its own
    pub fn is_declared(&self) -> bool {
        self.absolute || self.view_box
    }
}

/// Check the root `<svg>` start tag.
///
/// Fails when the root element is missing or declares a negative width,
/// height or viewBox extent.
pub fn check_root(svg: &str) -> Result<RootSize, String> {
    let tag = root_tag(svg).ok_or_else(|| "No <svg> root element".to_string())?;

    let width = attribute(tag, "width");
    let height = attribute(tag, "height");
    for value in [width, height].into_iter().flatten() {
        if value.starts_with('-') {
            return Err(format!("Negative SVG dimension {:?}", value));
        }
    }

    let view_box = attribute(tag, "viewBox");
    if let Some(value) = view_box {
        let mut extent = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .skip(2);
        if extent.any(|s| s.starts_with('-')) {
            return Err(format!("Negative SVG viewBox {:?}", value));
        }
    }

    let is_absolute = |value: Option<&str>| value.is_some_and(|v| !v.is_empty() && !v.ends_with('%'));
    Ok(RootSize {
        absolute: is_absolute(width) && is_absolute(height),
        view_box: view_box.is_some(),
    })
}

/// Parse and rasterize SVG bytes.
///
/// With a desired size the scene is scaled by `desired / intrinsic` on each
/// axis; otherwise it is drawn 1:1 at the intrinsic size usvg resolves.
pub(crate) fn rasterize(
    data: &[u8],
    desired: Option<(u32, u32)>,
    origin: &str,
) -> Result<RgbaBitmap, DecodeError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| DecodeError::decode(origin, "Failed to parse image."))?;
    let root = check_root(text).map_err(|reason| DecodeError::decode(origin, reason))?;

    if !root.is_declared() && desired.is_none() {
        return Err(DecodeError::MissingDimensions(origin.to_string()));
    }

    let mut options = usvg::Options::default();
    if let Some(size) = desired.and_then(|(w, h)| usvg::Size::from_wh(w as f32, h as f32)) {
        // Only consulted when the root element declares no absolute size
        options.default_size = size;
    }
    let tree = usvg::Tree::from_str(text, &options)
        .map_err(|e| DecodeError::decode(origin, format!("Failed to parse SVG: {}", e)))?;

    let size = tree.size();
    let (width, height, transform) = match desired {
        Some((w, h)) => (
            w,
            h,
            Transform::from_scale(w as f32 / size.width(), h as f32 / size.height()),
        ),
        None => (
            size.width().ceil() as u32,
            size.height().ceil() as u32,
            Transform::identity(),
        ),
    };
    if width == 0 || height == 0 {
        return Err(DecodeError::MissingDimensions(origin.to_string()));
    }

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| DecodeError::Allocation {
        origin: origin.to_string(),
        width,
        height,
    })?;
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    tracing::trace!(
        "Rasterized SVG {}x{} -> {}x{}",
        size.width(),
        size.height(),
        width,
        height
    );
    Ok(RgbaBitmap {
        width,
        height,
        pixels: pixmap.take(),
    })
}

/// Slice of the root start tag, without `<svg` and the closing `>`
fn root_tag(svg: &str) -> Option<&str> {
    let start = svg.find("<svg")?;
    let rest = &svg[start + 4..];
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/') {
        return None;
    }
    let end = rest.find('>')?;
    Some(&rest[..end])
}

/// Value of `name="..."` (or single-quoted) as a standalone attribute
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut search = 0;
    while let Some(found) = tag[search..].find(name) {
        let at = search + found;
        search = at + name.len();

        // reject stroke-width and friends
        let standalone = tag[..at].ends_with(|c: char| c.is_whitespace());
        let rest = tag[search..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else { continue };
        if !standalone {
            continue;
        }

        let rest = rest.trim_start();
        let quote = rest.chars().next().filter(|q| *q == '"' || *q == '\'')?;
        let value = &rest[1..];
        let end = value.find(quote)?;
        return Some(value[..end].trim());
    }
    None
}
