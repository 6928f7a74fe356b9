//! The reorderable layer panel.
//!
//! The panel lists layers top-first while the document keeps paint order
//! (bottom-first). For `n` layers, `store = n - 1 - display` in both
//! directions.

use crate::document::Document;
use crate::layer::{LayerId, LayerKind};

/// Longest label shown for a text layer.
const LABEL_MAX_CHARS: usize = 24;

/// Convert a display index to a store index.
#[must_use]
pub fn display_to_store(len: usize, display_index: usize) -> Option<usize> {
    (display_index < len).then(|| len - 1 - display_index)
}

/// Convert a store index to a display index.
#[must_use]
pub fn store_to_display(len: usize, store_index: usize) -> Option<usize> {
    display_to_store(len, store_index)
}

/// Direction of a one-step move in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Toward the top of the panel (drawn later, on top).
    Up,
    /// Toward the bottom of the panel (drawn earlier, underneath).
    Down,
}

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerListEntry {
    /// Row position, top-first.
    pub display_index: usize,
    /// Position in the document's paint order.
    pub store_index: usize,
    /// Layer id.
    pub id: LayerId,
    /// Row label.
    pub label: String,
    /// Whether this layer is selected.
    pub selected: bool,
}

impl Document {
    /// Rows for the layer panel, top-most layer first.
    #[must_use]
    pub fn layer_list(&self) -> Vec<LayerListEntry> {
        let len = self.len();
        let selected = self.selected();
        self.layers_display_order()
            .enumerate()
            .map(|(display_index, layer)| {
                let label = match &layer.kind {
                    LayerKind::Text(text) => text.content.chars().take(LABEL_MAX_CHARS).collect(),
                    LayerKind::Image(_) => "Image".to_string(),
                };
                LayerListEntry {
                    display_index,
                    store_index: len - 1 - display_index,
                    id: layer.id.clone(),
                    label,
                    selected: selected == Some(&layer.id),
                }
            })
            .collect()
    }

    /// Move the layer shown at `display_index` one row up or down.
    ///
    /// Returns `false` when the index is out of range or the layer is
    /// already at the edge.
    pub fn move_display(&mut self, display_index: usize, direction: MoveDirection) -> bool {
        let Some(store_index) = display_to_store(self.len(), display_index) else {
            return false;
        };
        let id = self.layers()[store_index].id.clone();
        match direction {
            MoveDirection::Up => self.move_up(&id),
            MoveDirection::Down => self.move_down(&id),
        }
    }

    /// Delete the layer shown at `display_index`.
    pub fn delete_display(&mut self, display_index: usize) -> bool {
        let Some(store_index) = display_to_store(self.len(), display_index) else {
            return false;
        };
        let id = self.layers()[store_index].id.clone();
        self.delete(&id).is_some()
    }
}
