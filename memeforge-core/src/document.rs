//! The layer store: an ordered layer list plus the current selection.
//!
//! List order is paint order. Index 0 is painted first (bottom-most); the
//! last layer is on top and is hit-tested first.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::layer::{Layer, LayerId};
use crate::{LayerError, LayerResult};

/// Default size of a newly dropped image layer.
pub const DEFAULT_IMAGE_SIZE: (f32, f32) = (200.0, 200.0);

/// Where "add text" places a new text layer (baseline start).
pub const DEFAULT_TEXT_POSITION: Point = Point::new(50.0, 80.0);

/// Default canvas background.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// An editable document: layers, selection and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Layers in paint order.
    layers: Vec<Layer>,
    /// Currently selected layer, if any.
    #[serde(default, rename = "selectedLayerId")]
    selected: Option<LayerId>,
    /// Canvas background color.
    #[serde(default = "Document::default_background", rename = "backgroundColor")]
    pub background: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    fn default_background() -> String {
        DEFAULT_BACKGROUND.to_string()
    }

    /// Create an empty document with a white background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            selected: None,
            background: Self::default_background(),
        }
    }

    /// Build a document from a layer list.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::DuplicateId`] if two layers share an id.
    pub fn from_layers(layers: Vec<Layer>) -> LayerResult<Self> {
        let mut doc = Self::new();
        doc.replace_layers(layers)?;
        Ok(doc)
    }

    /// Replace the whole layer list, keeping the selection only if it still exists.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::DuplicateId`] if two layers share an id.
    pub fn replace_layers(&mut self, layers: Vec<Layer>) -> LayerResult<()> {
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(&layer.id) {
                return Err(LayerError::DuplicateId(layer.id.to_string()));
            }
        }
        self.layers = layers;
        self.drop_stale_selection();
        Ok(())
    }

    /// Append a layer on top of the stack and select it.
    ///
    /// A layer whose id is already present replaces nothing; it gets a fresh id.
    pub fn add_layer(&mut self, mut layer: Layer) -> LayerId {
        if self.contains(&layer.id) {
            tracing::warn!("Layer id {} already in use, assigning a new one", layer.id);
            layer.id = LayerId::new();
        }
        let id = layer.id.clone();
        tracing::debug!("Added layer {id}");
        self.layers.push(layer);
        self.selected = Some(id.clone());
        id
    }

    /// Append an image layer at `at` with an explicit size.
    pub fn add_image(&mut self, content: impl Into<String>, at: Point, size: (f32, f32)) -> LayerId {
        self.add_layer(Layer::image(content, at.x, at.y).with_size(size.0, size.1))
    }

    /// Append a text layer with default styling at [`DEFAULT_TEXT_POSITION`].
    pub fn add_text(&mut self, content: impl Into<String>) -> LayerId {
        self.add_layer(Layer::text(
            content,
            DEFAULT_TEXT_POSITION.x,
            DEFAULT_TEXT_POSITION.y,
        ))
    }

    /// Remove a layer. Clears the selection if it was selected.
    ///
    /// Unknown ids are ignored.
    pub fn delete(&mut self, id: &LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::debug!("Deleted layer {id}");
        Some(self.layers.remove(index))
    }

    /// Remove a layer, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] if the layer is not present.
    pub fn remove(&mut self, id: &LayerId) -> LayerResult<Layer> {
        self.delete(id)
            .ok_or_else(|| LayerError::LayerNotFound(id.to_string()))
    }

    /// Remove every layer and clear the selection.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected = None;
    }

    /// Layers in paint order (bottom first).
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers in display order (top first).
    pub fn layers_display_order(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev()
    }

    /// Get a layer by id.
    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Get a mutable layer by id.
    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| &l.id == id)
    }

    /// Store index of a layer.
    #[must_use]
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| &l.id == id)
    }

    /// Whether a layer with this id exists.
    #[must_use]
    pub fn contains(&self, id: &LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Update a layer in place. Returns `false` if the layer does not exist.
    pub fn update<F>(&mut self, id: &LayerId, f: F) -> bool
    where
        F: FnOnce(&mut Layer),
    {
        match self.get_mut(id) {
            Some(layer) => {
                f(layer);
                true
            }
            None => false,
        }
    }

    /// Store a description on an image layer, if the layer still exists.
    ///
    /// Results for deleted layers (and for text layers) are dropped.
    pub fn apply_description(&mut self, id: &LayerId, description: String) -> bool {
        let applied = self
            .get_mut(id)
            .and_then(Layer::as_image_mut)
            .map(|image| image.layer_description = Some(description))
            .is_some();
        if !applied {
            tracing::debug!("Dropping description for missing layer {id}");
        }
        applied
    }

    /// Select a layer. Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: &LayerId) {
        if self.contains(id) {
            self.selected = Some(id.clone());
        } else {
            tracing::debug!("Select of unknown layer {id}, clearing selection");
            self.selected = None;
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected layer id, if it still exists.
    #[must_use]
    pub fn selected(&self) -> Option<&LayerId> {
        self.selected.as_ref().filter(|id| self.contains(id))
    }

    /// Currently selected layer.
    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Move a layer one step toward the top of the paint order.
    ///
    /// Returns `false` if the layer is unknown or already on top.
    pub fn move_up(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.layers.len() => {
                self.layers.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    /// Move a layer one step toward the bottom of the paint order.
    ///
    /// Returns `false` if the layer is unknown or already at the bottom.
    pub fn move_down(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                self.layers.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the document has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Set the background color.
    pub fn set_background(&mut self, color: impl Into<String>) {
        self.background = color.into();
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !self.contains(id) {
                self.selected = None;
            }
        }
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> LayerResult<String> {
        serde_json::to_string(self).map_err(LayerError::Serialization)
    }

    /// Deserialize a document from JSON.
    ///
    /// Accepts either a full document object or a bare layer array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains duplicate ids.
    pub fn from_json(json: &str) -> LayerResult<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Document(Document),
            Layers(Vec<Layer>),
        }

        match serde_json::from_str(json)? {
            Wire::Document(mut doc) => {
                let layers = std::mem::take(&mut doc.layers);
                doc.replace_layers(layers)?;
                Ok(doc)
            }
            Wire::Layers(layers) => Self::from_layers(layers),
        }
    }

    /// Write the document to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> LayerResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!("Saved {} layers to {}", self.len(), path.as_ref().display());
        Ok(())
    }

    /// Read a document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> LayerResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(doc: &Document) -> Vec<String> {
        doc.layers().iter().map(|l| l.id.to_string()).collect()
    }

    #[test]
    fn test_add_appends_on_top_and_selects() {
        let mut doc = Document::new();
        assert!(doc.is_empty());
        let a = doc.add_text("a");
        let b = doc.add_image("b.png", Point::new(1.0, 2.0), DEFAULT_IMAGE_SIZE);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.layers()[1].id, b);
        assert_eq!(doc.selected(), Some(&b));
        assert_eq!(doc.layers()[0].id, a);

        let text = doc.get(&a).expect("text layer");
        assert!((text.x - 50.0).abs() < f32::EPSILON);
        assert!((text.y - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut doc = Document::new();
        let a = doc.add_text("a");
        assert_eq!(doc.selected(), Some(&a));
        assert!(doc.delete(&a).is_some());
        assert!(doc.selected().is_none());
        assert!(doc.get(&a).is_none());
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let mut doc = Document::new();
        let a = doc.add_text("a");
        let b = doc.add_text("b");
        doc.delete(&a);
        assert_eq!(doc.selected(), Some(&b));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut doc = Document::new();
        doc.add_text("a");
        assert!(doc.delete(&LayerId::from("missing")).is_none());
        assert!(matches!(
            doc.remove(&LayerId::from("missing")),
            Err(LayerError::LayerNotFound(_))
        ));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut doc = Document::new();
        doc.add_text("a");
        doc.select(&LayerId::from("nope"));
        assert!(doc.selected().is_none());
    }

    #[test]
    fn test_move_up_and_down_swap_neighbours() {
        let mut doc = Document::new();
        let a = doc.add_text("a");
        let b = doc.add_text("b");
        let c = doc.add_text("c");

        assert!(doc.move_up(&a));
        assert_eq!(ids(&doc), vec![b.to_string(), a.to_string(), c.to_string()]);
        assert!(!doc.move_up(&c));
        assert!(doc.move_down(&c));
        assert_eq!(ids(&doc), vec![b.to_string(), c.to_string(), a.to_string()]);
        assert!(!doc.move_down(&b));
    }

    #[test]
    fn test_apply_description_only_to_existing_image() {
        let mut doc = Document::new();
        let img = doc.add_image("x.png", Point::default(), (10.0, 10.0));
        let txt = doc.add_text("t");
        assert!(doc.apply_description(&img, "a cat".to_string()));
        assert_eq!(
            doc.get(&img)
                .and_then(Layer::as_image)
                .and_then(|i| i.layer_description.as_deref()),
            Some("a cat")
        );
        assert!(!doc.apply_description(&txt, "ignored".to_string()));
        doc.delete(&img);
        assert!(!doc.apply_description(&img, "late".to_string()));
        assert!(doc.get(&img).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut layer = Layer::text("a", 0.0, 0.0);
        layer.id = LayerId::from("dup");
        let mut other = Layer::text("b", 0.0, 0.0);
        other.id = LayerId::from("dup");
        assert!(matches!(
            Document::from_layers(vec![layer, other]),
            Err(LayerError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_ids_and_selection() {
        let mut doc = Document::new();
        doc.add_text("a");
        let b = doc.add_image("b.png", Point::new(3.0, 4.0), (5.0, 6.0));
        doc.set_background("#000");

        let json = doc.to_json().expect("serialize");
        let back = Document::from_json(&json).expect("deserialize");
        assert_eq!(back, doc);
        assert_eq!(back.selected(), Some(&b));
    }

    #[test]
    fn test_from_json_accepts_bare_layer_array() {
        let json = r#"[{"id":"1","type":"text","x":0,"y":10,"content":"hi"}]"#;
        let doc = Document::from_json(json).expect("parse");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.background, DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_from_json_drops_stale_selection() {
        let json = r#"{"layers":[],"selectedLayerId":"gone"}"#;
        let doc = Document::from_json(json).expect("parse");
        assert!(doc.selected().is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        let mut doc = Document::new();
        doc.add_text("persisted");
        doc.save_to_path(&path).expect("save");

        let loaded = Document::load_from_path(&path).expect("load");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = Document::load_from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(LayerError::Io(_))));
    }
}
