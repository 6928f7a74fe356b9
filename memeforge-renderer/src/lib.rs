//! # Memeforge Renderer
//!
//! Immediate-mode painter for memeforge documents.
//!
//! ## Surfaces
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              paint(): Surface               │
//! ├──────────────────────┬──────────────────────┤
//! │ RasterSurface        │ RecordingSurface     │
//! │ (tiny-skia pixels,   │ (draw-call log,      │
//! │  ab_glyph text)      │  fixed metrics)      │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! Bitmaps come from the [`ImageCache`], which decodes in the background
//! and publishes results when drained. Text faces come from a [`FontBook`]
//! backed by installed fonts and an embedded fallback.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod fonts;
pub mod image;
pub mod image_cache;
pub mod paint;
pub mod raster;
pub mod recording;
pub mod surface;

pub use error::{RenderError, RenderResult};
pub use export::{encode_png, png_data_url, write_png};
pub use fonts::{Face, FontBook};
pub use crate::image::{bytes_to_data_url, encode_data_url, parse_data_url, Bitmap, ImageFormat};
pub use image_cache::{
    CacheStats, DefaultLoader, EntryState, ImageCache, ImageCacheConfig, SourceLoader,
};
pub use paint::{paint, BitmapLookup, BitmapSizes, PaintStyle};
pub use raster::RasterSurface;
pub use recording::{DrawOp, RecordingSurface};
pub use surface::{Path, PathCommand, StrokeStyle, Surface};

use memeforge_core::Document;

/// The main renderer interface.
///
/// Wraps [`paint`] with a fixed style and counts frames.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: PaintStyle,
    frame_count: u64,
}

impl Renderer {
    /// Create a renderer with the given decoration style.
    #[must_use]
    pub fn new(style: PaintStyle) -> Self {
        Self {
            style,
            frame_count: 0,
        }
    }

    /// Repaint `doc` onto `surface`.
    pub fn render<S: Surface>(&mut self, surface: &mut S, doc: &Document, images: &dyn BitmapLookup) {
        paint(
            surface,
            doc.layers(),
            &doc.background,
            doc.selected(),
            images,
            &self.style,
        );
        self.frame_count += 1;
        tracing::trace!("Frame {} painted ({} layers)", self.frame_count, doc.len());
    }

    /// Get the current frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Decoration style.
    #[must_use]
    pub fn style(&self) -> &PaintStyle {
        &self.style
    }
}
