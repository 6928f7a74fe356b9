//! Immediate-mode 2D drawing surface.
//!
//! [`Surface`] is the drawing context the painter talks to. It mirrors the
//! shape of a browser 2D canvas: a save/restore state stack holding the
//! current transform, global alpha and clip, plus path fills, strokes,
//! bitmaps and text.

use memeforge_core::{Color, FontSpec, Point, Rect, TextMeasure};

use crate::image::Bitmap;

/// Bezier handle length for a quarter circle of unit radius.
const KAPPA: f32 = 0.552_284_8;

/// One path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(Point),
    /// Straight segment.
    LineTo(Point),
    /// Cubic Bezier segment: two control points then the end point.
    CubicTo(Point, Point, Point),
    /// Close the current subpath.
    Close,
}

/// A backend-neutral vector path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// An empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new subpath.
    #[must_use]
    pub fn move_to(mut self, p: Point) -> Self {
        self.commands.push(PathCommand::MoveTo(p));
        self
    }

    /// Add a straight segment.
    #[must_use]
    pub fn line_to(mut self, p: Point) -> Self {
        self.commands.push(PathCommand::LineTo(p));
        self
    }

    /// Add a cubic Bezier segment.
    #[must_use]
    pub fn cubic_to(mut self, c1: Point, c2: Point, end: Point) -> Self {
        self.commands.push(PathCommand::CubicTo(c1, c2, end));
        self
    }

    /// Close the current subpath.
    #[must_use]
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// A single line segment.
    #[must_use]
    pub fn line(from: Point, to: Point) -> Self {
        Self::new().move_to(from).line_to(to)
    }

    /// A closed axis-aligned rectangle.
    #[must_use]
    pub fn rect(r: &Rect) -> Self {
        Self::new()
            .move_to(Point::new(r.x, r.y))
            .line_to(Point::new(r.right(), r.y))
            .line_to(Point::new(r.right(), r.bottom()))
            .line_to(Point::new(r.x, r.bottom()))
            .close()
    }

    /// A rectangle with quarter-circle corners of `radius`.
    ///
    /// The radius is used as given. A radius larger than half the shorter
    /// side produces a self-intersecting outline.
    #[must_use]
    pub fn rounded_rect(r: &Rect, radius: f32) -> Self {
        let (x, y, right, bottom) = (r.x, r.y, r.right(), r.bottom());
        let k = radius * KAPPA;
        Self::new()
            .move_to(Point::new(x + radius, y))
            .line_to(Point::new(right - radius, y))
            .cubic_to(
                Point::new(right - radius + k, y),
                Point::new(right, y + radius - k),
                Point::new(right, y + radius),
            )
            .line_to(Point::new(right, bottom - radius))
            .cubic_to(
                Point::new(right, bottom - radius + k),
                Point::new(right - radius + k, bottom),
                Point::new(right - radius, bottom),
            )
            .line_to(Point::new(x + radius, bottom))
            .cubic_to(
                Point::new(x + radius - k, bottom),
                Point::new(x, bottom - radius + k),
                Point::new(x, bottom - radius),
            )
            .line_to(Point::new(x, y + radius))
            .cubic_to(
                Point::new(x, y + radius - k),
                Point::new(x + radius - k, y),
                Point::new(x + radius, y),
            )
            .close()
    }

    /// A full circle.
    #[must_use]
    pub fn circle(center: Point, radius: f32) -> Self {
        let (cx, cy, r) = (center.x, center.y, radius);
        let k = r * KAPPA;
        Self::new()
            .move_to(Point::new(cx + r, cy))
            .cubic_to(
                Point::new(cx + r, cy + k),
                Point::new(cx + k, cy + r),
                Point::new(cx, cy + r),
            )
            .cubic_to(
                Point::new(cx - k, cy + r),
                Point::new(cx - r, cy + k),
                Point::new(cx - r, cy),
            )
            .cubic_to(
                Point::new(cx - r, cy - k),
                Point::new(cx - k, cy - r),
                Point::new(cx, cy - r),
            )
            .cubic_to(
                Point::new(cx + k, cy - r),
                Point::new(cx + r, cy - k),
                Point::new(cx + r, cy),
            )
            .close()
    }

    /// Path segments in order.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Whether the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Line width in pixels.
    pub width: f32,
    /// Stroke color.
    pub color: Color,
    /// Dash pattern `[on, off]`, or solid when `None`.
    pub dash: Option<[f32; 2]>,
}

impl StrokeStyle {
    /// A solid stroke.
    #[must_use]
    pub fn solid(width: f32, color: Color) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    /// A dashed stroke.
    #[must_use]
    pub fn dashed(width: f32, color: Color, dash: [f32; 2]) -> Self {
        Self {
            width,
            color,
            dash: Some(dash),
        }
    }
}

/// A 2D drawing context.
///
/// Coordinates pass through the current transform. `save` pushes the
/// transform, global alpha and clip; `restore` pops them.
pub trait Surface: TextMeasure {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface with `color`, ignoring transform and clip.
    fn fill_background(&mut self, color: Color);

    /// Push the current drawing state.
    fn save(&mut self);

    /// Pop the drawing state. Unbalanced calls are ignored.
    fn restore(&mut self);

    /// Translate the current transform.
    fn translate(&mut self, dx: f32, dy: f32);

    /// Rotate the current transform clockwise by `radians`.
    fn rotate(&mut self, radians: f32);

    /// Set the opacity applied to subsequent drawing.
    fn set_global_alpha(&mut self, alpha: f32);

    /// Intersect the clip with `path`.
    fn clip(&mut self, path: &Path);

    /// Draw `bitmap` scaled into `dest`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect);

    /// Stroke `path`.
    fn stroke(&mut self, path: &Path, style: &StrokeStyle);

    /// Fill `path` with `color`.
    fn fill(&mut self, path: &Path, color: Color);

    /// Set the font used by [`Surface::fill_text`].
    fn set_font(&mut self, font: &FontSpec);

    /// Draw `text` left-aligned on an alphabetic baseline at `at`.
    fn fill_text(&mut self, text: &str, at: Point, color: Color);
}
