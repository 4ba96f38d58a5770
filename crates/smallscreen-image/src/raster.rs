//! Raster decoder
//!
//! Supports PNG, JPEG, GIF, WebP and BMP via the image crate.

use image::ImageFormat as ImgFormat;

/// Raster formats recognized by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: GIF87a or GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        // BMP: BM + file size + reserved
        if data.len() >= 14 && data.starts_with(b"BM") {
            return Self::Bmp;
        }

        Self::Unknown
    }

    fn to_image_format(self) -> Option<ImgFormat> {
        match self {
            Self::Png => Some(ImgFormat::Png),
            Self::Jpeg => Some(ImgFormat::Jpeg),
            Self::Gif => Some(ImgFormat::Gif),
            Self::WebP => Some(ImgFormat::WebP),
            Self::Bmp => Some(ImgFormat::Bmp),
            Self::Unknown => None,
        }
    }
}

/// Premultiplied RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RgbaBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode sniffed raster bytes into premultiplied RGBA.
///
/// The error is only a reason string: a raster failure is expected before
/// the vector attempt and is not surfaced on its own.
pub(crate) fn decode(data: &[u8]) -> Result<RgbaBitmap, String> {
    let format = ImageFormat::from_bytes(data);
    let img_format = format
        .to_image_format()
        .ok_or_else(|| "Unsupported image format".to_string())?;

    let img = image::load_from_memory_with_format(data, img_format)
        .map_err(|e| format!("Decode failed: {}", e))?;

    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixels = rgba.into_raw();
    premultiply(&mut pixels);

    tracing::trace!("Decoded {:?} {}x{}", format, width, height);
    Ok(RgbaBitmap { width, height, pixels })
}

/// Scale color channels by alpha, in place
pub(crate) fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}
