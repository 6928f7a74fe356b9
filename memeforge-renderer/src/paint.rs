//! The layer painter.
//!
//! [`paint`] redraws the whole document on every call: background first,
//! then each layer bottom to top, each inside its own rotated frame.
//! Nothing is cached between calls.

use std::collections::HashMap;

use memeforge_core::{
    Color, Corner, HandleConfig, ImageLayer, ImageSizes, Layer, LayerGeometry, LayerId, LayerKind,
    Metrics, Point, Rect, TextLayer,
};

use crate::image::Bitmap;
use crate::surface::{Path, StrokeStyle, Surface};

/// Width of underline and strikethrough strokes.
const TEXT_DECORATION_WIDTH: f32 = 2.0;

/// Gap between the baseline and the underline.
const UNDERLINE_OFFSET: f32 = 2.0;

/// Synchronous access to decoded bitmaps by content key.
pub trait BitmapLookup {
    /// The decoded bitmap for `key`, if it is ready.
    fn lookup(&self, key: &str) -> Option<&Bitmap>;
}

impl BitmapLookup for HashMap<String, Bitmap> {
    fn lookup(&self, key: &str) -> Option<&Bitmap> {
        self.get(key)
    }
}

/// Exposes bitmap natural sizes for geometry derivation.
#[derive(Clone, Copy)]
pub struct BitmapSizes<'a>(pub &'a dyn BitmapLookup);

impl ImageSizes for BitmapSizes<'_> {
    fn natural_size(&self, key: &str) -> Option<(f32, f32)> {
        self.0.lookup(key).map(Bitmap::natural_size)
    }
}

/// Colors and sizes of selection decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    /// Handle radii and offsets.
    pub handles: HandleConfig,
    /// Selection outline and handle border color.
    pub highlight: Color,
    /// Selection outline width.
    pub outline_width: f32,
    /// Fill of corner and resize handles.
    pub handle_fill: Color,
    /// Fill of the rotate handle.
    pub rotate_fill: Color,
    /// Dash pattern of the text selection box.
    pub text_dash: [f32; 2],
    /// Border color used when a border width is set without a color.
    pub default_border: Color,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            handles: HandleConfig::default(),
            highlight: Color::rgb(0x1e, 0x90, 0xff),
            outline_width: 2.0,
            handle_fill: Color::WHITE,
            rotate_fill: Color::rgb(0x22, 0xc5, 0x5e),
            text_dash: [6.0, 4.0],
            default_border: Color::BLACK,
        }
    }
}

/// Paint `layers` onto `surface`.
///
/// Image layers whose bitmap is not in `images` get no body (but are still
/// decorated when selected). Never fails.
pub fn paint<S: Surface>(
    surface: &mut S,
    layers: &[Layer],
    background: &str,
    selected: Option<&LayerId>,
    images: &dyn BitmapLookup,
    style: &PaintStyle,
) {
    surface.fill_background(Color::parse_or_black(background));
    let sizes = BitmapSizes(images);

    for layer in layers {
        let geometry = LayerGeometry::of(layer, Metrics::new(&*surface, &sizes));
        let is_selected = selected == Some(&layer.id);
        tracing::trace!(
            "Paint layer {} at ({}, {}) rotation {}{}",
            layer.id,
            layer.x,
            layer.y,
            geometry.rotation,
            if is_selected { " [selected]" } else { "" }
        );

        surface.save();
        if geometry.rotation != 0.0 {
            let pivot = geometry.pivot;
            surface.translate(pivot.x, pivot.y);
            surface.rotate(geometry.rotation.to_radians());
            surface.translate(-pivot.x, -pivot.y);
        }

        match &layer.kind {
            LayerKind::Image(image) => {
                paint_image(surface, image, geometry.body(), images, style);
                if is_selected {
                    decorate_image(surface, &geometry, style);
                }
            }
            LayerKind::Text(text) => {
                paint_text(surface, text, Point::new(layer.x, layer.y), geometry.text_width());
                if is_selected {
                    decorate_text(surface, &geometry, style);
                }
            }
        }
        surface.restore();
    }
}

fn paint_image<S: Surface>(
    surface: &mut S,
    image: &ImageLayer,
    rect: Rect,
    images: &dyn BitmapLookup,
    style: &PaintStyle,
) {
    let Some(bitmap) = images.lookup(&image.content) else {
        tracing::trace!("Bitmap not ready, skipping body");
        return;
    };

    let radius = image.border_radius.unwrap_or(0.0);
    let outline = if radius > 0.0 {
        Path::rounded_rect(&rect, radius)
    } else {
        Path::rect(&rect)
    };

    surface.save();
    surface.set_global_alpha(image.opacity);
    if radius > 0.0 {
        surface.clip(&outline);
    }
    surface.draw_bitmap(bitmap, rect);
    surface.restore();

    if let Some(width) = image.border() {
        let color = image
            .border_color
            .as_deref()
            .map_or(style.default_border, Color::parse_or_black);
        surface.stroke(&outline, &StrokeStyle::solid(width, color));
    }
}

fn paint_text<S: Surface>(surface: &mut S, text: &TextLayer, origin: Point, width: f32) {
    let color = Color::parse_or_black(&text.color);
    surface.set_font(&text.font());
    surface.fill_text(&text.content, origin, color);

    let decoration = StrokeStyle::solid(TEXT_DECORATION_WIDTH, color);
    if text.underline {
        let y = origin.y + UNDERLINE_OFFSET;
        surface.stroke(
            &Path::line(Point::new(origin.x, y), Point::new(origin.x + width, y)),
            &decoration,
        );
    }
    if text.strikethrough {
        let y = origin.y - text.font_size / 2.0;
        surface.stroke(
            &Path::line(Point::new(origin.x, y), Point::new(origin.x + width, y)),
            &decoration,
        );
    }
}

fn draw_handle<S: Surface>(surface: &mut S, center: Point, radius: f32, fill: Color, style: &PaintStyle) {
    let circle = Path::circle(center, radius);
    surface.fill(&circle, fill);
    surface.stroke(&circle, &StrokeStyle::solid(style.outline_width, style.highlight));
}

fn decorate_image<S: Surface>(surface: &mut S, geometry: &LayerGeometry, style: &PaintStyle) {
    let cfg = &style.handles;
    surface.stroke(
        &Path::rect(&geometry.body()),
        &StrokeStyle::solid(style.outline_width, style.highlight),
    );
    for corner in Corner::ALL {
        if let Some(p) = geometry.corner(corner) {
            draw_handle(surface, p, cfg.corner_handle_radius, style.handle_fill, style);
        }
    }
    draw_handle(
        surface,
        geometry.rotate_handle(cfg),
        cfg.rotate_handle_radius,
        style.rotate_fill,
        style,
    );
}

fn decorate_text<S: Surface>(surface: &mut S, geometry: &LayerGeometry, style: &PaintStyle) {
    let cfg = &style.handles;
    surface.stroke(
        &Path::rect(&geometry.body()),
        &StrokeStyle::dashed(style.outline_width, style.highlight, style.text_dash),
    );
    if let Some(p) = geometry.text_resize_handle(cfg) {
        draw_handle(surface, p, cfg.text_resize_handle_radius, style.handle_fill, style);
    }
    draw_handle(
        surface,
        geometry.rotate_handle(cfg),
        cfg.rotate_handle_radius,
        style.rotate_fill,
        style,
    );
}
