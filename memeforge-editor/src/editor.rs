//! The editor shell: one document, one canvas, one pointer.
//!
//! [`Editor`] owns the layer store and routes user actions to it. Background
//! work (bitmap decodes, image descriptions) reports back over channels that
//! [`Editor::pump`] drains between events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use memeforge_core::{
    Document, HitTarget, InteractionEngine, LayerEdit, LayerId, LayerKind, LayerListEntry, Metrics,
    MoveDirection, Point, PointerEvent,
};
use memeforge_renderer::{
    bytes_to_data_url, encode_png, png_data_url, write_png, DefaultLoader, ImageCache,
    ImageCacheConfig, PaintStyle, RasterSurface, Renderer,
};

use crate::config::EditorConfig;
use crate::description::{DescriptionQueue, DescriptionService, HttpDescriptionService};
use crate::error::EditorResult;

/// File name used by [`Editor::download`].
pub const EXPORT_FILE_NAME: &str = "meme.png";

/// Interactive layer editor backed by a raster canvas.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    document: Document,
    engine: InteractionEngine,
    cache: ImageCache,
    descriptions: DescriptionQueue,
    renderer: Renderer,
    surface: RasterSurface,
    dirty: bool,
}

impl Editor {
    /// Create an editor with an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be allocated, the font file
    /// cannot be loaded, or the description endpoint is invalid.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        let mut surface = RasterSurface::new(config.width, config.height)?;
        if let Some(font) = &config.font {
            surface.load_font_file(font)?;
        }

        let service: Option<Arc<dyn DescriptionService>> = match &config.describe_url {
            Some(url) => Some(Arc::new(HttpDescriptionService::new(url)?)),
            None => None,
        };

        let cache = ImageCache::with_loader(
            Arc::new(DefaultLoader::new()),
            ImageCacheConfig {
                max_entries: config.max_cached_images,
            },
        );

        let style = PaintStyle::default();
        let mut document = Document::new();
        if let Some(background) = &config.background {
            document.set_background(background.clone());
        }

        tracing::info!(
            "Editor ready: {}x{} canvas, font {}, descriptions {}",
            config.width,
            config.height,
            if surface.fonts().is_pinned() { "pinned" } else { "system" },
            if service.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            engine: InteractionEngine::new(style.handles),
            renderer: Renderer::new(style),
            descriptions: DescriptionQueue::new(service),
            config,
            document,
            cache,
            surface,
            dirty: true,
        })
    }

    /// Replace the description service.
    #[must_use]
    pub fn with_description_service(mut self, service: Arc<dyn DescriptionService>) -> Self {
        self.descriptions = DescriptionQueue::new(Some(service));
        self
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Swap in a whole document and start loading its images.
    pub fn load_document(&mut self, mut document: Document) {
        if let Some(background) = &self.config.background {
            document.set_background(background.clone());
        }
        tracing::info!("Loaded document with {} layers", document.len());
        self.document = document;
        self.sync_images();
        self.engine = InteractionEngine::new(*self.engine.config());
        self.dirty = true;
    }

    /// Load a document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(&mut self, path: impl AsRef<Path>) -> EditorResult<()> {
        let document = Document::load_from_path(path)?;
        self.load_document(document);
        Ok(())
    }

    /// Save the document to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> EditorResult<()> {
        self.document.save_to_path(path)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Layer creation
    // ------------------------------------------------------------------

    /// Add a dropped image file as a new layer.
    ///
    /// The bytes become a data URL that both names the layer's content and
    /// keys the image cache. Decoding and the description request run in the
    /// background.
    pub fn drop_image(&mut self, bytes: &[u8]) -> LayerId {
        let url = bytes_to_data_url(bytes);
        let id = self.document.add_image(
            url.clone(),
            self.config.drop_position,
            self.config.default_image_size,
        );
        tracing::info!("Dropped image ({} bytes) as layer {id}", bytes.len());
        self.sync_images();
        self.descriptions.request(id.clone(), url);
        self.dirty = true;
        id
    }

    /// Read an image file and drop it onto the canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn drop_image_file(&mut self, path: impl AsRef<Path>) -> EditorResult<LayerId> {
        let bytes = std::fs::read(path)?;
        Ok(self.drop_image(&bytes))
    }

    /// Add a text layer at the default position.
    pub fn add_text(&mut self, content: impl Into<String>) -> LayerId {
        let id = self.document.add_text(content);
        self.dirty = true;
        id
    }

    // ------------------------------------------------------------------
    // Pointer and selection
    // ------------------------------------------------------------------

    /// Route a pointer event to the interaction engine.
    ///
    /// Returns `true` if the document changed.
    pub fn pointer(&mut self, event: &PointerEvent) -> bool {
        let metrics = Metrics::new(&self.surface, &self.cache);
        let changed = self.engine.handle(&mut self.document, metrics, event);
        self.dirty |= changed;
        changed
    }

    /// What a pointer at `p` would grab.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> HitTarget {
        self.engine
            .hit_test(&self.document, Metrics::new(&self.surface, &self.cache), p)
    }

    /// Select a layer.
    pub fn select(&mut self, id: &LayerId) {
        self.document.select(id);
        self.dirty = true;
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Property and layer panels
    // ------------------------------------------------------------------

    /// Apply a property edit to a layer.
    pub fn apply_edit(&mut self, id: &LayerId, edit: &LayerEdit) -> bool {
        let applied = self.document.apply_edit(id, edit, &self.cache);
        self.dirty |= applied;
        applied
    }

    /// Apply a property edit to the selected layer, if any.
    pub fn edit_selected(&mut self, edit: &LayerEdit) -> bool {
        match self.document.selected().cloned() {
            Some(id) => self.apply_edit(&id, edit),
            None => false,
        }
    }

    /// Delete a layer.
    pub fn delete(&mut self, id: &LayerId) -> bool {
        let deleted = self.document.delete(id).is_some();
        self.dirty |= deleted;
        deleted
    }

    /// Delete the selected layer, if any.
    pub fn delete_selected(&mut self) -> bool {
        match self.document.selected().cloned() {
            Some(id) => self.delete(&id),
            None => false,
        }
    }

    /// Layer panel rows, topmost first.
    #[must_use]
    pub fn layer_list(&self) -> Vec<LayerListEntry> {
        self.document.layer_list()
    }

    /// Move a layer panel row one step.
    pub fn move_display(&mut self, display_index: usize, direction: MoveDirection) -> bool {
        let moved = self.document.move_display(display_index, direction);
        self.dirty |= moved;
        moved
    }

    /// Delete a layer panel row.
    pub fn delete_display(&mut self, display_index: usize) -> bool {
        let deleted = self.document.delete_display(display_index);
        self.dirty |= deleted;
        deleted
    }

    /// Change the canvas background.
    pub fn set_background(&mut self, color: impl Into<String>) {
        self.document.set_background(color);
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Background work and painting
    // ------------------------------------------------------------------

    /// Keep every image layer's bitmap loaded, reloading any the cache
    /// evicted.
    fn sync_images(&mut self) {
        let live = self
            .document
            .layers()
            .iter()
            .filter_map(|layer| match &layer.kind {
                LayerKind::Image(image) => Some(image.content.as_str()),
                LayerKind::Text(_) => None,
            });
        let started = self.cache.set_live(live);
        if started > 0 {
            tracing::debug!("Started {started} image loads");
        }
    }

    /// Apply finished decodes and descriptions.
    ///
    /// Returns `true` if the canvas needs a repaint.
    pub fn pump(&mut self) -> bool {
        self.sync_images();
        let decoded = self.cache.drain();
        let described = self.descriptions.drain(&mut self.document);
        if decoded > 0 || described > 0 {
            tracing::debug!("Pumped {decoded} decodes, {described} descriptions");
        }
        self.dirty |= decoded > 0;
        self.dirty
    }

    /// Wait for all background work and apply it.
    ///
    /// Returns how many cache entries and layers changed.
    pub async fn settle(&mut self) -> usize {
        self.sync_images();
        let decoded = self.cache.settle().await;
        let described = self.descriptions.settle(&mut self.document).await;
        self.dirty |= decoded > 0;
        decoded + described
    }

    /// Repaint the canvas.
    pub fn render(&mut self) {
        self.sync_images();
        self.renderer
            .render(&mut self.surface, &self.document, &self.cache);
        self.dirty = false;
    }

    /// Pump background work and repaint if anything changed.
    ///
    /// Returns `true` if a frame was painted.
    pub fn frame(&mut self) -> bool {
        if self.pump() {
            self.render();
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Paint the document without selection decorations and encode it as
    /// PNG. The selection is restored afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn export_png(&mut self) -> EditorResult<Vec<u8>> {
        let prior = self.document.selected().cloned();
        self.document.clear_selection();
        self.render();
        let png = encode_png(&self.surface);

        if let Some(id) = prior {
            self.document.select(&id);
        }
        self.render();
        Ok(png?)
    }

    /// Export as a `data:image/png;base64,...` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn export_data_url(&mut self) -> EditorResult<String> {
        Ok(png_data_url(&self.export_png()?))
    }

    /// Export and write [`EXPORT_FILE_NAME`] into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    pub fn download(&mut self, dir: impl AsRef<Path>) -> EditorResult<PathBuf> {
        let png = self.export_png()?;
        let path = dir.as_ref().join(EXPORT_FILE_NAME);
        write_png(&path, &png)?;
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The layer document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Editor configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The canvas.
    #[must_use]
    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// The bitmap cache.
    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// The interaction engine.
    #[must_use]
    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    /// Pending description requests.
    #[must_use]
    pub fn descriptions(&self) -> &DescriptionQueue {
        &self.descriptions
    }

    /// Painted frames so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.renderer.frame_count()
    }

    /// Whether something changed since the last paint.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use memeforge_core::{DragState, RotationField};

    use super::*;

    fn editor() -> Editor {
        Editor::new(EditorConfig::default().with_size(100, 100)).expect("editor")
    }

    #[test]
    fn test_add_text_selects_and_dirties() {
        let mut editor = editor();
        editor.render();
        assert!(!editor.is_dirty());
        let id = editor.add_text("hello");
        assert_eq!(editor.document().selected(), Some(&id));
        assert!(editor.is_dirty());
        assert!(editor.frame());
        assert!(!editor.frame());
    }

    #[test]
    fn test_edit_selected_routes_to_selection() {
        let mut editor = editor();
        assert!(!editor.edit_selected(&LayerEdit::Bold(true)));
        let id = editor.add_text("hi");
        assert!(editor.edit_selected(&LayerEdit::Bold(true)));
        assert!(!editor.edit_selected(&LayerEdit::Opacity(0.5)));

        let mut field = RotationField::for_rotation(None);
        field.input("4");
        field.input("45");
        assert!(editor.edit_selected(&LayerEdit::Rotation(field.rotation())));
        let layer = editor.document().get(&id).expect("layer");
        assert_eq!(layer.rotation, Some(45.0));
        assert!(layer.as_text().is_some_and(|t| t.bold));
    }

    #[test]
    fn test_drop_without_runtime_keeps_layer() {
        let mut editor = editor();
        let id = editor.drop_image(&[0x89, b'P', b'N', b'G']);
        let layer = editor.document().get(&id).expect("layer");
        let image = layer.as_image().expect("image");
        assert!(image.content.starts_with("data:image/png;base64,"));
        assert_eq!((image.width, image.height), (Some(200.0), Some(200.0)));
        assert_eq!((layer.x, layer.y), (50.0, 50.0));
        assert_eq!(editor.descriptions().pending(), 0);
    }

    #[test]
    fn test_delete_selected_and_layer_panel() {
        let mut editor = editor();
        let a = editor.add_text("a");
        let b = editor.add_text("b");
        assert_eq!(editor.layer_list()[0].id, b);
        assert!(editor.move_display(0, MoveDirection::Down));
        assert_eq!(editor.layer_list()[0].id, a);

        assert!(editor.delete_selected());
        assert!(editor.document().selected().is_none());
        assert!(!editor.delete_selected());
        assert!(editor.delete_display(0));
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_pointer_on_empty_canvas() {
        let mut editor = editor();
        assert!(!editor.pointer(&PointerEvent::down(10.0, 10.0)));
        assert!(editor.engine().state().is_idle());
        assert_eq!(editor.hit_test(Point::new(10.0, 10.0)), HitTarget::Miss);
        assert_eq!(*editor.engine().state(), DragState::Idle);
    }

    #[test]
    fn test_load_document_applies_background_override() {
        let config = EditorConfig {
            background: Some("#101010".into()),
            ..EditorConfig::default().with_size(10, 10)
        };
        let mut editor = Editor::new(config).expect("editor");
        let mut doc = Document::new();
        doc.add_text("x");
        editor.load_document(doc);
        assert_eq!(editor.document().background, "#101010");
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_missing_font_file_fails() {
        let config = EditorConfig {
            font: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..EditorConfig::default()
        };
        assert!(Editor::new(config).is_err());
    }
}
