//! Property-panel edits.
//!
//! The side panel edits one field at a time. [`LayerEdit`] is one such edit;
//! [`RotationField`] is the free-text rotation input, which has to tolerate
//! half-typed values while the user is still typing.

use crate::document::Document;
use crate::layer::{ImageSizes, Layer, LayerId, LayerKind};

/// A single property change from the side panel.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEdit {
    /// Text content.
    Content(String),
    /// Text fill color.
    Color(String),
    /// Text font family.
    FontFamily(String),
    /// Text font size (at least 1px).
    FontSize(f32),
    /// Bold toggle.
    Bold(bool),
    /// Italic toggle.
    Italic(bool),
    /// Underline toggle.
    Underline(bool),
    /// Strikethrough toggle.
    Strikethrough(bool),
    /// Image opacity, clamped to `0..=1`.
    Opacity(f32),
    /// Image border color; `None` removes it.
    BorderColor(Option<String>),
    /// Image border width, clamped to be non-negative.
    BorderWidth(f32),
    /// Image corner radius, clamped to half the shorter side when the size is known.
    BorderRadius(f32),
    /// Rotation override in degrees; `None` clears it.
    Rotation(Option<f32>),
}

impl LayerEdit {
    /// Apply this edit to `layer`.
    ///
    /// Returns `false` when the edit does not apply to the layer's kind.
    pub fn apply(&self, layer: &mut Layer, images: &dyn ImageSizes) -> bool {
        if let Self::Rotation(rotation) = self {
            layer.rotation = *rotation;
            return true;
        }
        match &mut layer.kind {
            LayerKind::Text(text) => match self {
                Self::Content(s) => text.content.clone_from(s),
                Self::Color(c) => text.color.clone_from(c),
                Self::FontFamily(f) => text.font_family.clone_from(f),
                Self::FontSize(size) => text.font_size = size.max(1.0),
                Self::Bold(v) => text.bold = *v,
                Self::Italic(v) => text.italic = *v,
                Self::Underline(v) => text.underline = *v,
                Self::Strikethrough(v) => text.strikethrough = *v,
                _ => return false,
            },
            LayerKind::Image(image) => match self {
                Self::Opacity(v) => image.opacity = v.clamp(0.0, 1.0),
                Self::BorderColor(c) => image.border_color.clone_from(c),
                Self::BorderWidth(w) => image.border_width = Some(w.max(0.0)),
                Self::BorderRadius(r) => {
                    let (w, h) = image.effective_size(images);
                    let mut radius = r.max(0.0);
                    if w > 0.0 && h > 0.0 {
                        radius = radius.min(w.min(h) / 2.0);
                    }
                    image.border_radius = Some(radius);
                }
                _ => return false,
            },
        }
        true
    }
}

impl Document {
    /// Apply a property edit to a layer.
    ///
    /// Returns `false` if the layer does not exist or the edit does not apply.
    pub fn apply_edit(&mut self, id: &LayerId, edit: &LayerEdit, images: &dyn ImageSizes) -> bool {
        let applied = self
            .get_mut(id)
            .is_some_and(|layer| edit.apply(layer, images));
        if !applied {
            tracing::debug!("Edit {edit:?} not applied to layer {id}");
        }
        applied
    }
}

/// Free-text rotation input.
///
/// Holds the literal text being typed. An integer commits immediately; on
/// blur the field is either cleared (no rotation), normalized to a clean
/// integer, or reverted to the last committed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationField {
    text: String,
    committed: Option<i32>,
}

impl RotationField {
    /// Create a field showing the given layer rotation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_rotation(rotation: Option<f32>) -> Self {
        let committed = rotation.map(|r| r.round() as i32);
        Self {
            text: committed.map(|r| r.to_string()).unwrap_or_default(),
            committed,
        }
    }

    /// The literal text shown in the field.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The last committed value (`None` = no rotation override).
    #[must_use]
    pub fn committed(&self) -> Option<i32> {
        self.committed
    }

    /// Record a keystroke.
    ///
    /// Returns the new rotation when the text is a valid integer, otherwise
    /// `None` (the partial text is kept, nothing is committed).
    pub fn input(&mut self, text: &str) -> Option<i32> {
        self.text = text.to_string();
        let value = self.text.trim().parse::<i32>().ok()?;
        self.committed = Some(value);
        Some(value)
    }

    /// Finish editing. Returns the value to store on the layer.
    #[allow(clippy::cast_possible_truncation)]
    pub fn blur(&mut self) -> Option<i32> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            self.committed = None;
        } else if let Ok(value) = trimmed.parse::<i32>() {
            self.committed = Some(value);
        } else if let Some(value) = trimmed
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
        {
            self.committed = Some(value.round() as i32);
        }
        self.text = self.committed.map(|r| r.to_string()).unwrap_or_default();
        self.committed
    }

    /// The committed value as a layer rotation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rotation(&self) -> Option<f32> {
        self.committed.map(|r| r as f32)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::layer::NoImages;

    #[test]
    fn test_text_edits() {
        let mut layer = Layer::text("a", 0.0, 0.0);
        assert!(LayerEdit::Content("b".into()).apply(&mut layer, &NoImages));
        assert!(LayerEdit::Bold(true).apply(&mut layer, &NoImages));
        assert!(LayerEdit::Strikethrough(true).apply(&mut layer, &NoImages));
        let text = layer.as_text().expect("text");
        assert_eq!(text.content, "b");
        assert!(text.bold && text.strikethrough);
        assert!(!LayerEdit::Opacity(0.5).apply(&mut layer, &NoImages));
    }

    #[test]
    fn test_image_edits_clamp() {
        let mut layer = Layer::image("a", 0.0, 0.0).with_size(40.0, 100.0);
        assert!(LayerEdit::Opacity(3.0).apply(&mut layer, &NoImages));
        assert!(LayerEdit::BorderWidth(-2.0).apply(&mut layer, &NoImages));
        assert!(LayerEdit::BorderRadius(500.0).apply(&mut layer, &NoImages));
        let image = layer.as_image().expect("image");
        assert!((image.opacity - 1.0).abs() < f32::EPSILON);
        assert_eq!(image.border_width, Some(0.0));
        assert_eq!(image.border_radius, Some(20.0));
        assert!(!LayerEdit::Bold(true).apply(&mut layer, &NoImages));
    }

    #[test]
    fn test_border_radius_uses_natural_size() {
        let mut layer = Layer::image("cat", 0.0, 0.0);
        let sizes: HashMap<String, (f32, f32)> = [("cat".to_string(), (30.0, 60.0))].into();
        LayerEdit::BorderRadius(99.0).apply(&mut layer, &sizes);
        assert_eq!(layer.as_image().and_then(|i| i.border_radius), Some(15.0));

        // Unknown size: stored as typed.
        let mut unsized_layer = Layer::image("dog", 0.0, 0.0);
        LayerEdit::BorderRadius(99.0).apply(&mut unsized_layer, &NoImages);
        assert_eq!(
            unsized_layer.as_image().and_then(|i| i.border_radius),
            Some(99.0)
        );
    }

    #[test]
    fn test_rotation_edit_applies_to_both_kinds() {
        let mut text = Layer::text("a", 0.0, 0.0);
        let mut image = Layer::image("a", 0.0, 0.0);
        assert!(LayerEdit::Rotation(Some(15.0)).apply(&mut text, &NoImages));
        assert!(LayerEdit::Rotation(Some(-30.0)).apply(&mut image, &NoImages));
        assert_eq!(text.rotation, Some(15.0));
        assert_eq!(image.rotation, Some(-30.0));
        assert!(LayerEdit::Rotation(None).apply(&mut image, &NoImages));
        assert!(image.rotation.is_none());
    }

    #[test]
    fn test_document_apply_edit_unknown_layer() {
        let mut doc = Document::new();
        assert!(!doc.apply_edit(&LayerId::from("x"), &LayerEdit::Bold(true), &NoImages));
    }

    #[test]
    fn test_rotation_field_tolerates_partial_input() {
        let mut field = RotationField::for_rotation(Some(10.0));
        assert_eq!(field.text(), "10");
        assert_eq!(field.input("-"), None);
        assert_eq!(field.text(), "-");
        assert_eq!(field.committed(), Some(10));
        assert_eq!(field.input("-4"), Some(-4));
        assert_eq!(field.input("-45"), Some(-45));
        assert_eq!(field.blur(), Some(-45));
        assert_eq!(field.text(), "-45");
    }

    #[test]
    fn test_rotation_field_blur_empty_clears() {
        let mut field = RotationField::for_rotation(Some(30.0));
        field.input("");
        assert_eq!(field.blur(), None);
        assert_eq!(field.text(), "");
        assert!(field.rotation().is_none());
    }

    #[test]
    fn test_rotation_field_blur_normalizes() {
        let mut field = RotationField::default();
        field.input(" 007 ");
        assert_eq!(field.blur(), Some(7));
        assert_eq!(field.text(), "7");

        field.input("12.6");
        assert_eq!(field.blur(), Some(13));
        assert_eq!(field.text(), "13");
    }

    #[test]
    fn test_rotation_field_blur_garbage_reverts() {
        let mut field = RotationField::for_rotation(Some(90.0));
        field.input("9x");
        assert_eq!(field.blur(), Some(90));
        assert_eq!(field.text(), "90");
    }
}
