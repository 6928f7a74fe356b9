//! Layers - the building blocks of a document.
//!
//! A layer is a common header (`id`, `x`, `y`, `rotation`) plus one of two
//! payloads. Image layers are anchored at their top-left corner; text layers
//! are anchored at the left end of their alphabetic baseline and grow upward.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default font size for new text layers, in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Default font family for new text layers.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Default fill color for new text layers.
pub const DEFAULT_TEXT_COLOR: &str = "#222";

/// Unique, immutable identifier for a layer.
///
/// Ids are opaque strings so documents written by other tools load unchanged;
/// new ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bitmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Bitmap source (URL or data-URL). Doubles as the image cache key.
    pub content: String,
    /// Explicit width; falls back to the bitmap's natural width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Explicit height; falls back to the bitmap's natural height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Opacity in `0..=1`.
    #[serde(default = "ImageLayer::default_opacity")]
    pub opacity: f32,
    /// Stroke color for the border.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Stroke width for the border; no border when absent or zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    /// Corner rounding in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    /// Text filled in by the description service. Never painted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_description: Option<String>,
}

impl ImageLayer {
    const fn default_opacity() -> f32 {
        1.0
    }

    /// Create an image payload with default styling.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            width: None,
            height: None,
            opacity: 1.0,
            border_color: None,
            border_width: None,
            border_radius: None,
            layer_description: None,
        }
    }

    /// Width and height, falling back to the natural bitmap size, then zero.
    #[must_use]
    pub fn effective_size(&self, images: &dyn ImageSizes) -> (f32, f32) {
        let natural = if self.width.is_none() || self.height.is_none() {
            images.natural_size(&self.content)
        } else {
            None
        };
        let w = self.width.or(natural.map(|n| n.0)).unwrap_or(0.0);
        let h = self.height.or(natural.map(|n| n.1)).unwrap_or(0.0);
        (w, h)
    }

    /// Border stroke width, if a border should be drawn.
    #[must_use]
    pub fn border(&self) -> Option<f32> {
        self.border_width.filter(|w| *w > 0.0)
    }
}

/// A single-line text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct TextLayer {
    /// The literal text.
    pub content: String,
    /// Font size in pixels.
    #[serde(default = "TextLayer::default_font_size")]
    pub font_size: f32,
    /// Font family name.
    #[serde(default = "TextLayer::default_font_family")]
    pub font_family: String,
    /// Fill color.
    #[serde(default = "TextLayer::default_color")]
    pub color: String,
    /// Bold weight.
    #[serde(default)]
    pub bold: bool,
    /// Italic style.
    #[serde(default)]
    pub italic: bool,
    /// Underline decoration.
    #[serde(default)]
    pub underline: bool,
    /// Strikethrough decoration.
    #[serde(default)]
    pub strikethrough: bool,
}

impl TextLayer {
    const fn default_font_size() -> f32 {
        DEFAULT_FONT_SIZE
    }

    fn default_font_family() -> String {
        DEFAULT_FONT_FAMILY.to_string()
    }

    fn default_color() -> String {
        DEFAULT_TEXT_COLOR.to_string()
    }

    /// Create a text payload with default styling.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: Self::default_font_family(),
            color: Self::default_color(),
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }

    /// The font this layer is drawn and measured with.
    #[must_use]
    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size: self.font_size,
            bold: self.bold,
            italic: self.italic,
        }
    }
}

/// The payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// A bitmap.
    Image(ImageLayer),
    /// A line of text.
    Text(TextLayer),
}

/// A layer with its position header and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// Left edge (images) or baseline start (text).
    pub x: f32,
    /// Top edge (images) or baseline (text).
    pub y: f32,
    /// Clockwise rotation in degrees about the layer's own center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// Layer content.
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create an image layer with a fresh id.
    #[must_use]
    pub fn image(content: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: LayerId::new(),
            x,
            y,
            rotation: None,
            kind: LayerKind::Image(ImageLayer::new(content)),
        }
    }

    /// Create a text layer with a fresh id.
    #[must_use]
    pub fn text(content: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: LayerId::new(),
            x,
            y,
            rotation: None,
            kind: LayerKind::Text(TextLayer::new(content)),
        }
    }

    /// Set an explicit size (image layers only; ignored for text).
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        if let LayerKind::Image(image) = &mut self.kind {
            image.width = Some(width);
            image.height = Some(height);
        }
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Set the font size (text layers only; ignored for images).
    #[must_use]
    pub fn with_font_size(mut self, size: f32) -> Self {
        if let LayerKind::Text(text) = &mut self.kind {
            text.font_size = size;
        }
        self
    }

    /// Rotation in degrees, zero when unset.
    #[must_use]
    pub fn rotation_deg(&self) -> f32 {
        self.rotation.unwrap_or(0.0)
    }

    /// Image payload, if this is an image layer.
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            LayerKind::Text(_) => None,
        }
    }

    /// Mutable image payload, if this is an image layer.
    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.kind {
            LayerKind::Image(image) => Some(image),
            LayerKind::Text(_) => None,
        }
    }

    /// Text payload, if this is a text layer.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            LayerKind::Image(_) => None,
        }
    }

    /// Mutable text payload, if this is a text layer.
    pub fn as_text_mut(&mut self) -> Option<&mut TextLayer> {
        match &mut self.kind {
            LayerKind::Text(text) => Some(text),
            LayerKind::Image(_) => None,
        }
    }
}

/// Font selection for drawing and measuring text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name.
    pub family: String,
    /// Size in pixels.
    pub size: f32,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
}

impl FontSpec {
    /// CSS font shorthand: `"[italic ][bold ]{size}px {family}"`.
    #[must_use]
    pub fn css(&self) -> String {
        let italic = if self.italic { "italic " } else { "" };
        let bold = if self.bold { "bold " } else { "" };
        format!("{italic}{bold}{}px {}", self.size, self.family)
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

/// Something that can measure text with a live drawing context.
pub trait TextMeasure {
    /// Advance width of `text` set in `font`, or `None` when no drawing
    /// context (or no usable font) is available.
    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<f32>;
}

/// Lookup of natural bitmap sizes by image content key.
pub trait ImageSizes {
    /// Natural `(width, height)` of the decoded bitmap, if it is available.
    fn natural_size(&self, key: &str) -> Option<(f32, f32)>;
}

/// An [`ImageSizes`] that knows no bitmaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSizes for NoImages {
    fn natural_size(&self, _key: &str) -> Option<(f32, f32)> {
        None
    }
}

impl ImageSizes for HashMap<String, (f32, f32)> {
    fn natural_size(&self, key: &str) -> Option<(f32, f32)> {
        self.get(key).copied()
    }
}
