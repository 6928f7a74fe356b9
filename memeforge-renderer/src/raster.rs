//! Pixel surface backed by tiny-skia, with ab_glyph text.
//!
//! Text faces come from a [`FontBook`]. When the resolved face lacks a
//! requested style, bold is synthesized by smearing glyph coverage sideways
//! and italic by shearing.

use std::path::Path as FsPath;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use memeforge_core::{Color, FontSpec, Point, Rect, TextMeasure};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::fonts::{Face, FontBook};
use crate::image::Bitmap;
use crate::surface::{Path, PathCommand, StrokeStyle, Surface};

/// Horizontal shear applied to synthesized italics.
const ITALIC_SKEW: f32 = 0.2;

#[derive(Clone)]
struct DrawState {
    transform: Transform,
    alpha: f32,
    clip: Option<Mask>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            alpha: 1.0,
            clip: None,
        }
    }
}

/// A tiny-skia pixmap with a canvas-style state stack.
pub struct RasterSurface {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    fonts: FontBook,
    spec: FontSpec,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.stack.len())
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl RasterSurface {
    /// Create a transparent surface that resolves text faces against
    /// installed fonts.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the size overflows.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::Surface(format!("Cannot allocate {width}x{height} surface")))?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
            fonts: FontBook::system(),
            spec: FontSpec::default(),
        })
    }

    /// Resolve text faces through `fonts`.
    #[must_use]
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    /// Use `font` for all text.
    #[must_use]
    pub fn with_font(self, font: FontArc) -> Self {
        self.with_fonts(FontBook::pinned(font))
    }

    /// Parse TrueType/OpenType bytes and use them for all text.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a font.
    pub fn load_font(&mut self, bytes: Vec<u8>) -> RenderResult<()> {
        self.fonts = FontBook::from_bytes(bytes)?;
        Ok(())
    }

    /// Load a font file and use it for all text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_font_file(&mut self, path: impl AsRef<FsPath>) -> RenderResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
        self.load_font(bytes)?;
        tracing::debug!("Loaded font {}", path.display());
        Ok(())
    }

    /// Where text faces come from.
    #[must_use]
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// The painted pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color of one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Color::rgba(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    fn paint_for(&self, color: Color) -> Paint<'static> {
        let c = color.with_alpha_factor(self.state.alpha);
        let mut paint = Paint::default();
        paint.set_color_rgba8(c.r, c.g, c.b, c.a);
        paint.anti_alias = true;
        paint
    }

    /// Rasterize `text` into a coverage pixmap. Returns the pixmap and the
    /// offset of its top-left corner from the baseline origin.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn rasterize_text(&self, face: &Face, text: &str, color: Color) -> Option<(Pixmap, f32, f32)> {
        let font = &face.font;
        let scale = PxScale::from(self.spec.size);
        let scaled = font.as_scaled(scale);

        let mut caret = 0.0f32;
        let mut last: Option<GlyphId> = None;
        let mut outlines = Vec::new();
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = last {
                caret += scaled.kern(prev, id);
            }
            if let Some(outlined) = font.outline_glyph(id.with_scale_and_position(scale, point(caret, 0.0))) {
                outlines.push(outlined);
            }
            caret += scaled.h_advance(id);
            last = Some(id);
        }
        if outlines.is_empty() {
            return None;
        }

        let (mut left, mut top, mut right, mut bottom) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for outlined in &outlines {
            let b = outlined.px_bounds();
            left = left.min(b.min.x);
            top = top.min(b.min.y);
            right = right.max(b.max.x);
            bottom = bottom.max(b.max.y);
        }
        let (left, top) = (left.floor(), top.floor());
        let embolden = if face.synthetic_bold {
            (self.spec.size / 24.0).round().max(1.0) as u32
        } else {
            0
        };
        let width = (right - left).ceil() as u32 + embolden + 1;
        let height = (bottom - top).ceil() as u32 + 1;

        let mut coverage = vec![0.0f32; (width * height) as usize];
        for outlined in &outlines {
            let b = outlined.px_bounds();
            let ox = (b.min.x - left) as u32;
            let oy = (b.min.y - top) as u32;
            outlined.draw(|gx, gy, c| {
                let y = oy + gy;
                for dx in 0..=embolden {
                    let x = ox + gx + dx;
                    if x < width && y < height {
                        let i = (y * width + x) as usize;
                        coverage[i] = coverage[i].max(c);
                    }
                }
            });
        }

        let mut glyphs = Pixmap::new(width, height)?;
        for (px, cov) in glyphs.pixels_mut().iter_mut().zip(&coverage) {
            let a = (f32::from(color.a) * cov.clamp(0.0, 1.0)).round() as u8;
            *px = ColorU8::from_rgba(color.r, color.g, color.b, a).premultiply();
        }
        Some((glyphs, left, top))
    }
}

fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(p) => pb.move_to(p.x, p.y),
            PathCommand::LineTo(p) => pb.line_to(p.x, p.y),
            PathCommand::CubicTo(c1, c2, end) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}

fn measure_with(font: &FontArc, text: &str, size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        last = Some(id);
    }
    width
}

impl TextMeasure for RasterSurface {
    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<f32> {
        self.fonts
            .resolve(font)
            .map(|face| measure_with(&face.font, text, font.size))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn fill_background(&mut self, color: Color) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => tracing::debug!("Unbalanced restore ignored"),
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.pre_translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.pre_rotate(radians.to_degrees());
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn clip(&mut self, path: &Path) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let transform = self.state.transform;
        if let Some(mask) = self.state.clip.as_mut() {
            mask.intersect_path(&path, FillRule::Winding, true, transform);
        } else if let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) {
            mask.fill_path(&path, FillRule::Winding, true, transform);
            self.state.clip = Some(mask);
        }
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect) {
        let (bw, bh) = bitmap.natural_size();
        if dest.width == 0.0 || dest.height == 0.0 {
            return;
        }
        let transform = self
            .state
            .transform
            .pre_translate(dest.x, dest.y)
            .pre_scale(dest.width / bw, dest.height / bh);
        let paint = PixmapPaint {
            opacity: self.state.alpha,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            bitmap.pixmap().as_ref(),
            &paint,
            transform,
            self.state.clip.as_ref(),
        );
    }

    fn stroke(&mut self, path: &Path, style: &StrokeStyle) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let mut stroke = Stroke {
            width: style.width,
            ..Stroke::default()
        };
        if let Some([on, off]) = style.dash {
            stroke.dash = StrokeDash::new(vec![on, off], 0.0);
        }
        let paint = self.paint_for(style.color);
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    fn fill(&mut self, path: &Path, color: Color) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let paint = self.paint_for(color);
        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.spec = font.clone();
    }

    fn fill_text(&mut self, text: &str, at: Point, color: Color) {
        let Some(face) = self.fonts.resolve(&self.spec) else {
            tracing::trace!("No face for {}, skipping text", self.spec.css());
            return;
        };
        let color = color.with_alpha_factor(self.state.alpha);
        let Some((glyphs, left, top)) = self.rasterize_text(&face, text, color) else {
            return;
        };

        let mut transform = self.state.transform.pre_translate(at.x, at.y);
        if face.synthetic_italic {
            transform = transform.pre_concat(Transform::from_row(1.0, 0.0, -ITALIC_SKEW, 1.0, 0.0, 0.0));
        }
        transform = transform.pre_translate(left, top);
        self.pixmap.draw_pixmap(
            0,
            0,
            glyphs.as_ref(),
            &PixmapPaint::default(),
            transform,
            self.state.clip.as_ref(),
        );
    }
}
