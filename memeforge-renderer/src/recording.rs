//! A surface that records draw calls instead of rasterizing.
//!
//! Useful for inspecting exactly what the painter asked for, and as a
//! headless surface with deterministic text metrics.

use memeforge_core::{Color, FontSpec, Point, Rect, TextMeasure};

use crate::image::Bitmap;
use crate::surface::{Path, StrokeStyle, Surface};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `fill_background`.
    Background(Color),
    /// `save`.
    Save,
    /// `restore`.
    Restore,
    /// `translate`.
    Translate(f32, f32),
    /// `rotate`, in radians.
    Rotate(f32),
    /// `set_global_alpha`.
    GlobalAlpha(f32),
    /// `clip`.
    Clip(Path),
    /// `draw_bitmap`.
    Bitmap {
        /// Source bitmap size in pixels.
        source: (u32, u32),
        /// Destination rectangle.
        dest: Rect,
    },
    /// `stroke`.
    Stroke(Path, StrokeStyle),
    /// `fill`.
    Fill(Path, Color),
    /// `set_font`, as a CSS font string.
    Font(String),
    /// `fill_text`.
    Text {
        /// The string drawn.
        text: String,
        /// Baseline start.
        at: Point,
        /// Fill color.
        color: Color,
        /// CSS font string in effect.
        font: String,
    },
}

/// Records every call made on it.
///
/// Text is measured as `chars * font_size * advance`. With metrics disabled
/// measurement returns `None`, as when no drawing context is available.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
    font: String,
    advance: Option<f32>,
}

impl RecordingSurface {
    /// Default advance per character, as a fraction of the font size.
    pub const DEFAULT_ADVANCE: f32 = 0.5;

    /// Create a recording surface with default text metrics.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            font: FontSpec::default().css(),
            advance: Some(Self::DEFAULT_ADVANCE),
        }
    }

    /// Create a recording surface that cannot measure text.
    #[must_use]
    pub fn without_metrics(width: u32, height: u32) -> Self {
        Self {
            advance: None,
            ..Self::new(width, height)
        }
    }

    /// Use a different per-character advance.
    #[must_use]
    pub fn with_advance(mut self, advance: f32) -> Self {
        self.advance = Some(advance);
        self
    }

    /// All recorded calls in order.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Forget recorded calls.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Recorded text draws.
    pub fn texts(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Text { .. }))
    }

    /// Recorded bitmap draws.
    pub fn bitmaps(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Bitmap { .. }))
    }

    /// Recorded strokes.
    pub fn strokes(&self) -> impl Iterator<Item = (&Path, &StrokeStyle)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Stroke(path, style) => Some((path, style)),
            _ => None,
        })
    }
}

impl TextMeasure for RecordingSurface {
    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<f32> {
        self.advance
            .map(|advance| text.chars().count() as f32 * font.size * advance)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_background(&mut self, color: Color) {
        self.ops.push(DrawOp::Background(color));
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.ops.push(DrawOp::Translate(dx, dy));
    }

    fn rotate(&mut self, radians: f32) {
        self.ops.push(DrawOp::Rotate(radians));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn clip(&mut self, path: &Path) {
        self.ops.push(DrawOp::Clip(path.clone()));
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect) {
        self.ops.push(DrawOp::Bitmap {
            source: (bitmap.width(), bitmap.height()),
            dest,
        });
    }

    fn stroke(&mut self, path: &Path, style: &StrokeStyle) {
        self.ops.push(DrawOp::Stroke(path.clone(), style.clone()));
    }

    fn fill(&mut self, path: &Path, color: Color) {
        self.ops.push(DrawOp::Fill(path.clone(), color));
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = font.css();
        self.ops.push(DrawOp::Font(self.font.clone()));
    }

    fn fill_text(&mut self, text: &str, at: Point, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            color,
            font: self.font.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_modes() {
        let font = FontSpec {
            size: 20.0,
            ..FontSpec::default()
        };
        let surface = RecordingSurface::new(10, 10);
        assert_eq!(surface.measure_text("abcd", &font), Some(40.0));
        let narrow = RecordingSurface::new(10, 10).with_advance(0.25);
        assert_eq!(narrow.measure_text("abcd", &font), Some(20.0));
        let blind = RecordingSurface::without_metrics(10, 10);
        assert_eq!(blind.measure_text("abcd", &font), None);
    }

    #[test]
    fn test_text_records_current_font() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.set_font(&FontSpec {
            family: "serif".into(),
            size: 12.0,
            bold: true,
            italic: false,
        });
        surface.fill_text("x", Point::new(1.0, 2.0), Color::BLACK);
        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(
            texts,
            vec![&DrawOp::Text {
                text: "x".into(),
                at: Point::new(1.0, 2.0),
                color: Color::BLACK,
                font: "bold 12px serif".into(),
            }]
        );
    }
}
