//! Bitmap decoding and data URLs.
//!
//! Image layers name their bitmap by a content key: a URL, a file path or a
//! `data:` URL. This module turns bytes into [`Bitmap`]s and converts between
//! raw bytes and data URLs.

use std::sync::Arc;

use base64::Engine;
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{RenderError, RenderResult};

/// A decoded bitmap, stored premultiplied and ready to draw.
///
/// Cloning is cheap; pixel data is shared.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixmap: Arc<Pixmap>,
}

impl Bitmap {
    /// Build a bitmap from straight (non-premultiplied) RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero or does not match `rgba`.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> RenderResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if rgba.len() as u64 != expected {
            return Err(RenderError::Decode(format!(
                "Expected {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::Decode(format!("Invalid bitmap size {width}x{height}")))?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(Self {
            pixmap: Arc::new(pixmap),
        })
    }

    /// Decode PNG, JPEG, WebP, GIF or BMP bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a supported image.
    pub fn decode(data: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(data).map_err(|e| {
            let format = ImageFormat::from_magic_bytes(data).name();
            RenderError::Decode(format!("{format} image: {e}"))
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.as_raw())
    }

    /// A bitmap of one solid color.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RenderResult<Self> {
        let pixels = rgba.repeat((width * height) as usize);
        Self::from_rgba(width, height, &pixels)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Natural size as layer units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn natural_size(&self) -> (f32, f32) {
        (self.width() as f32, self.height() as f32)
    }

    /// Approximate memory footprint.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.pixmap.data().len()
    }

    /// Premultiplied pixel data.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame).
    Gif,
    /// Windows bitmap.
    Bmp,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            "image/bmp" => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.starts_with(b"BM") {
            return Self::Bmp;
        }
        Self::Unknown
    }

    /// MIME type used in data URLs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Unknown => "application/octet-stream",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::WebP => "WebP",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::Unknown => "unrecognized",
        }
    }
}

/// Encode bytes as a base64 data URL with an explicit MIME type.
#[must_use]
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Encode image bytes as a data URL, sniffing the MIME type.
#[must_use]
pub fn bytes_to_data_url(bytes: &[u8]) -> String {
    encode_data_url(ImageFormat::from_magic_bytes(bytes).mime(), bytes)
}

/// Split a data URL into its MIME type and decoded payload.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...` and
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the URL is malformed.
pub fn parse_data_url(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mut parts = metadata.split(';');
    let mime = parts.next().unwrap_or_default().to_string();
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok((mime, bytes))
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}
