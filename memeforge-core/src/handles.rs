//! Derived on-screen geometry of a layer: body box, pivot and handles.
//!
//! Nothing here is stored on the layer. Geometry is recomputed from the
//! current field values (and, for text, the current font metrics) every time
//! it is needed, by both the renderer and the interaction engine.

use crate::geometry::{from_local_frame, to_local_frame, Point, Rect};
use crate::layer::{ImageSizes, Layer, LayerKind, TextMeasure};

/// Handle sizes, offsets and interaction limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleConfig {
    /// Hit radius around the rotate handle.
    pub rotate_hit_radius: f32,
    /// Hit radius around each image corner handle.
    pub corner_hit_radius: f32,
    /// Hit radius around the text resize handle.
    pub text_resize_hit_radius: f32,
    /// Distance of the image rotate handle below the box.
    pub image_rotate_offset: f32,
    /// Distance of the text rotate handle below the baseline.
    pub text_rotate_offset: f32,
    /// Distance of the text resize handle to the right of the text.
    pub text_resize_offset: f32,
    /// Drawn radius of image corner handles.
    pub corner_handle_radius: f32,
    /// Drawn radius of the text resize handle.
    pub text_resize_handle_radius: f32,
    /// Drawn radius of the rotate handle.
    pub rotate_handle_radius: f32,
    /// Smallest width/height an image resize can produce.
    pub min_size: f32,
    /// Smallest font size a text resize can produce.
    pub min_font_size: f32,
    /// Pointer pixels per font-size pixel during a text resize.
    pub font_scale_divisor: f32,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            rotate_hit_radius: 16.0,
            corner_hit_radius: 12.0,
            text_resize_hit_radius: 18.0,
            image_rotate_offset: 22.0,
            text_rotate_offset: 18.0,
            text_resize_offset: 8.0,
            corner_handle_radius: 8.0,
            text_resize_handle_radius: 14.0,
            rotate_handle_radius: 12.0,
            min_size: 10.0,
            min_font_size: 8.0,
            font_scale_divisor: 2.0,
        }
    }
}

/// A corner of an image layer's box, in the layer's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left.
    TopLeft,
    /// Top-right.
    TopRight,
    /// Bottom-right.
    BottomRight,
    /// Bottom-left.
    BottomLeft,
}

impl Corner {
    /// All corners, in hit-test order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// Direction of this corner from the box center: `(±1, ±1)`.
    #[must_use]
    pub fn sign(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (-1.0, -1.0),
            Self::TopRight => (1.0, -1.0),
            Self::BottomRight => (1.0, 1.0),
            Self::BottomLeft => (-1.0, 1.0),
        }
    }

    /// The diagonally opposite corner.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }

    /// Position of this corner on `rect`.
    #[must_use]
    pub fn of(self, rect: &Rect) -> Point {
        match self {
            Self::TopLeft => Point::new(rect.x, rect.y),
            Self::TopRight => Point::new(rect.right(), rect.y),
            Self::BottomRight => Point::new(rect.right(), rect.bottom()),
            Self::BottomLeft => Point::new(rect.x, rect.bottom()),
        }
    }
}

/// Font metrics and bitmap sizes needed to derive layer geometry.
///
/// `text` is `None` when no live drawing context exists.
#[derive(Clone, Copy)]
pub struct Metrics<'a> {
    /// Text measurement, if a drawing context is available.
    pub text: Option<&'a dyn TextMeasure>,
    /// Natural sizes of decoded bitmaps.
    pub images: &'a dyn ImageSizes,
}

impl<'a> Metrics<'a> {
    /// Metrics backed by a live drawing context.
    #[must_use]
    pub fn new(text: &'a dyn TextMeasure, images: &'a dyn ImageSizes) -> Self {
        Self {
            text: Some(text),
            images,
        }
    }

    /// Metrics without a drawing context.
    #[must_use]
    pub fn without_context(images: &'a dyn ImageSizes) -> Self {
        Self { text: None, images }
    }
}

impl std::fmt::Debug for Metrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("has_context", &self.text.is_some())
            .finish_non_exhaustive()
    }
}

/// Shape-specific part of [`LayerGeometry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerShape {
    /// Image box in the local frame.
    Image {
        /// Bounding box.
        rect: Rect,
    },
    /// Text box from `(x, y - font_size)` to `(x + text_width, y)`.
    Text {
        /// Baseline start.
        origin: Point,
        /// Measured advance width (zero without a drawing context).
        text_width: f32,
        /// Font size in pixels.
        font_size: f32,
    },
}

/// Derived geometry of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerGeometry {
    /// Body shape in the local frame.
    pub shape: LayerShape,
    /// Rotation pivot (geometric center).
    pub pivot: Point,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Whether a drawing context was available to resolve the frame.
    pub has_context: bool,
}

impl LayerGeometry {
    /// Derive geometry for `layer`.
    #[must_use]
    pub fn of(layer: &Layer, metrics: Metrics<'_>) -> Self {
        let rotation = layer.rotation_deg();
        match &layer.kind {
            LayerKind::Image(image) => {
                let (w, h) = image.effective_size(metrics.images);
                let rect = Rect::new(layer.x, layer.y, w, h);
                Self {
                    shape: LayerShape::Image { rect },
                    pivot: rect.center(),
                    rotation,
                    has_context: metrics.text.is_some(),
                }
            }
            LayerKind::Text(text) => {
                let measured = metrics
                    .text
                    .and_then(|m| m.measure_text(&text.content, &text.font()));
                let text_width = measured.unwrap_or(0.0);
                Self {
                    shape: LayerShape::Text {
                        origin: Point::new(layer.x, layer.y),
                        text_width,
                        font_size: text.font_size,
                    },
                    pivot: Point::new(layer.x + text_width / 2.0, layer.y - text.font_size / 2.0),
                    rotation,
                    has_context: measured.is_some(),
                }
            }
        }
    }

    /// Body box in the local frame.
    #[must_use]
    pub fn body(&self) -> Rect {
        match self.shape {
            LayerShape::Image { rect } => rect,
            LayerShape::Text {
                origin,
                text_width,
                font_size,
            } => Rect::new(origin.x, origin.y - font_size, text_width, font_size),
        }
    }

    /// Measured text width (zero for images).
    #[must_use]
    pub fn text_width(&self) -> f32 {
        match self.shape {
            LayerShape::Text { text_width, .. } => text_width,
            LayerShape::Image { .. } => 0.0,
        }
    }

    /// Rotate handle center in the local frame.
    #[must_use]
    pub fn rotate_handle(&self, config: &HandleConfig) -> Point {
        match self.shape {
            LayerShape::Image { rect } => Point::new(
                rect.x + rect.width / 2.0,
                rect.bottom() + config.image_rotate_offset,
            ),
            LayerShape::Text {
                origin, text_width, ..
            } => Point::new(origin.x + text_width / 2.0, origin.y + config.text_rotate_offset),
        }
    }

    /// Corner position in the local frame (image layers only).
    #[must_use]
    pub fn corner(&self, corner: Corner) -> Option<Point> {
        match self.shape {
            LayerShape::Image { rect } => Some(corner.of(&rect)),
            LayerShape::Text { .. } => None,
        }
    }

    /// Resize handle center in the local frame (text layers only).
    #[must_use]
    pub fn text_resize_handle(&self, config: &HandleConfig) -> Option<Point> {
        match self.shape {
            LayerShape::Text {
                origin,
                text_width,
                font_size,
            } => Some(Point::new(
                origin.x + text_width + config.text_resize_offset,
                origin.y - font_size / 2.0,
            )),
            LayerShape::Image { .. } => None,
        }
    }

    /// Map a canvas point into this layer's local frame.
    ///
    /// Without a drawing context the point is returned unmodified.
    #[must_use]
    pub fn to_local(&self, p: Point) -> Point {
        if self.has_context {
            to_local_frame(self.pivot, self.rotation, p)
        } else {
            p
        }
    }

    /// Map a local-frame point into canvas space.
    #[must_use]
    pub fn to_world(&self, p: Point) -> Point {
        from_local_frame(self.pivot, self.rotation, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FontSpec, NoImages};

    /// Every character advances half the font size.
    struct HalfEm;

    impl TextMeasure for HalfEm {
        #[allow(clippy::cast_precision_loss)]
        fn measure_text(&self, text: &str, font: &FontSpec) -> Option<f32> {
            Some(text.chars().count() as f32 * font.size * 0.5)
        }
    }

    #[test]
    fn test_image_geometry() {
        let layer = Layer::image("a", 10.0, 20.0).with_size(100.0, 50.0);
        let g = LayerGeometry::of(&layer, Metrics::new(&HalfEm, &NoImages));
        assert_eq!(g.body(), Rect::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(g.pivot, Point::new(60.0, 45.0));
        let cfg = HandleConfig::default();
        assert_eq!(g.rotate_handle(&cfg), Point::new(60.0, 92.0));
        assert_eq!(g.corner(Corner::BottomRight), Some(Point::new(110.0, 70.0)));
        assert!(g.text_resize_handle(&cfg).is_none());
    }

    #[test]
    fn test_text_geometry_grows_upward() {
        let layer = Layer::text("Hi", 20.0, 40.0).with_font_size(32.0);
        let g = LayerGeometry::of(&layer, Metrics::new(&HalfEm, &NoImages));
        assert!((g.text_width() - 32.0).abs() < f32::EPSILON);
        assert_eq!(g.body(), Rect::new(20.0, 8.0, 32.0, 32.0));
        assert_eq!(g.pivot, Point::new(36.0, 24.0));
        let cfg = HandleConfig::default();
        assert_eq!(g.rotate_handle(&cfg), Point::new(36.0, 58.0));
        assert_eq!(g.text_resize_handle(&cfg), Some(Point::new(60.0, 24.0)));
    }

    #[test]
    fn test_without_context_skips_rotation() {
        let layer = Layer::image("a", 0.0, 0.0)
            .with_size(10.0, 10.0)
            .with_rotation(45.0);
        let g = LayerGeometry::of(&layer, Metrics::without_context(&NoImages));
        let p = Point::new(3.0, 4.0);
        assert_eq!(g.to_local(p), p);

        let text = Layer::text("Hi", 0.0, 10.0);
        let g = LayerGeometry::of(&text, Metrics::without_context(&NoImages));
        assert!(!g.has_context);
        assert!(g.text_width().abs() < f32::EPSILON);
    }

    #[test]
    fn test_corner_opposites_and_signs() {
        for corner in Corner::ALL {
            assert_eq!(corner.opposite().opposite(), corner);
            let (sx, sy) = corner.sign();
            let (ox, oy) = corner.opposite().sign();
            assert!((sx + ox).abs() < f32::EPSILON && (sy + oy).abs() < f32::EPSILON);
        }
    }
}
