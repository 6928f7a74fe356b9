//! Editor Integration Tests
//!
//! Drives the editor the way a user would: drop images, drag them, delete
//! them while a description is in flight, export and download.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memeforge_core::{Color, Document, HitTarget, Layer, LayerEdit, LayerId, Point, PointerEvent};
use memeforge_editor::{
    render_document, DescriptionService, Editor, EditorConfig, EditorError, EditorResult,
    EXPORT_FILE_NAME,
};
use memeforge_renderer::{encode_png, Bitmap, RasterSurface, Surface};
use tokio::sync::Notify;

/// A solid-color PNG.
fn solid_png(width: u32, height: u32, color: Color) -> Vec<u8> {
    let mut surface = RasterSurface::new(width, height).expect("surface");
    surface.fill_background(color);
    encode_png(&surface).expect("png")
}

fn editor(width: u32, height: u32) -> Editor {
    Editor::new(EditorConfig::default().with_size(width, height)).expect("editor")
}

fn description(editor: &Editor, id: &LayerId) -> Option<String> {
    editor
        .document()
        .get(id)
        .and_then(Layer::as_image)
        .and_then(|image| image.layer_description.clone())
}

/// Answers only once released.
struct Gated {
    gate: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl DescriptionService for Gated {
    async fn describe(&self, _data_url: &str) -> EditorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok("a red square".to_string())
    }
}

/// Answers immediately.
struct Instant;

#[async_trait]
impl DescriptionService for Instant {
    async fn describe(&self, data_url: &str) -> EditorResult<String> {
        if data_url.starts_with("data:image/png") {
            Ok("a png".to_string())
        } else {
            Err(EditorError::Description("not a png".to_string()))
        }
    }
}

// ============================================================================
// Deletion and late descriptions
// ============================================================================

#[tokio::test]
async fn test_late_description_for_deleted_layer_is_dropped() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(Gated {
        gate: Arc::clone(&gate),
        calls: AtomicUsize::new(0),
    });
    let mut editor = editor(300, 300).with_description_service(service.clone());

    let id = editor.drop_image(&solid_png(4, 4, Color::rgb(255, 0, 0)));
    assert_eq!(editor.document().selected(), Some(&id));
    assert_eq!(editor.descriptions().pending(), 1);

    assert!(editor.delete_selected());
    assert!(editor.document().selected().is_none());
    assert!(editor.document().get(&id).is_none());

    gate.notify_one();
    editor.settle().await;
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert_eq!(editor.descriptions().pending(), 0);
    assert!(editor.document().is_empty(), "late answer must not revive the layer");
    assert!(editor.document().selected().is_none());
    editor.render();
}

#[tokio::test]
async fn test_description_applied_to_live_layer() {
    let mut editor = editor(300, 300).with_description_service(Arc::new(Instant));

    let kept = editor.drop_image(&solid_png(4, 4, Color::rgb(255, 0, 0)));
    let removed = editor.drop_image(&solid_png(4, 4, Color::rgb(0, 0, 255)));
    editor.delete(&removed);

    editor.settle().await;
    assert_eq!(description(&editor, &kept).as_deref(), Some("a png"));
    assert!(description(&editor, &removed).is_none());
    assert_eq!(editor.document().len(), 1);
}

#[tokio::test]
async fn test_pump_applies_background_results() {
    let mut editor = editor(300, 300).with_description_service(Arc::new(Instant));
    let id = editor.drop_image(&solid_png(10, 10, Color::rgb(0, 0, 255)));
    editor.render();

    let mut repainted = false;
    for _ in 0..200 {
        if editor.frame() {
            repainted = true;
        }
        if repainted && description(&editor, &id).is_some() && editor.cache().pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(repainted, "decoded bitmap triggers a repaint");
    assert_eq!(description(&editor, &id).as_deref(), Some("a png"));
    assert_eq!(editor.surface().pixel(150, 150), Some(Color::rgb(0, 0, 255)));
}

// ============================================================================
// Pointer
// ============================================================================

#[tokio::test]
async fn test_drag_dropped_image() {
    let mut editor = editor(400, 400);
    let id = editor.drop_image(&solid_png(4, 4, Color::BLACK));
    editor.settle().await;

    assert!(!editor.pointer(&PointerEvent::down(100.0, 100.0)));
    assert!(editor.pointer(&PointerEvent::moved(120.0, 130.0)));
    assert!(!editor.pointer(&PointerEvent::up(120.0, 130.0)));
    assert!(editor.engine().state().is_idle());

    let layer = editor.document().get(&id).expect("layer");
    assert!((layer.x - 70.0).abs() < 1e-4);
    assert!((layer.y - 80.0).abs() < 1e-4);

    // Empty canvas click clears the selection.
    assert!(editor.pointer(&PointerEvent::down(390.0, 5.0)));
    assert!(editor.document().selected().is_none());
}

#[tokio::test]
async fn test_text_drawn_and_clickable_with_default_config() {
    let mut editor = editor(300, 200);
    let id = editor.add_text("HELLO WORLD");
    assert!(editor.apply_edit(&id, &LayerEdit::FontSize(48.0)));
    editor.clear_selection();
    editor.render();

    // Baseline at y=80, so the caps sit roughly between rows 45 and 80.
    let inked = (45..80)
        .flat_map(|y| (50..300).map(move |x| (x, y)))
        .filter(|&(x, y)| editor.surface().pixel(x, y) != Some(Color::WHITE))
        .count();
    assert!(inked > 100, "only {inked} pixels inked");

    assert_eq!(editor.hit_test(Point::new(70.0, 70.0)), HitTarget::Body(id.clone()));
    editor.pointer(&PointerEvent::down(70.0, 70.0));
    assert_eq!(editor.document().selected(), Some(&id));
    editor.pointer(&PointerEvent::up(70.0, 70.0));
}

// ============================================================================
// Bounded image cache
// ============================================================================

#[tokio::test]
async fn test_bounded_cache_keeps_every_painted_image() {
    let config = EditorConfig {
        max_cached_images: Some(1),
        ..EditorConfig::default().with_size(400, 400)
    };
    let mut editor = Editor::new(config).expect("editor");
    editor.drop_image(&solid_png(4, 4, Color::rgb(255, 0, 0)));
    editor.settle().await;
    let blue = editor.drop_image(&solid_png(4, 4, Color::rgb(0, 0, 255)));
    editor.settle().await;

    // Uncover the red layer by dragging the blue one away.
    editor.pointer(&PointerEvent::down(150.0, 150.0));
    editor.pointer(&PointerEvent::moved(350.0, 350.0));
    editor.pointer(&PointerEvent::up(350.0, 350.0));
    assert!((editor.document().get(&blue).expect("blue").x - 250.0).abs() < 1e-4);

    for _ in 0..3 {
        editor.frame();
        editor.settle().await;
        editor.render();
    }
    assert_eq!(editor.surface().pixel(100, 100), Some(Color::rgb(255, 0, 0)));
    assert_eq!(editor.surface().pixel(300, 300), Some(Color::rgb(0, 0, 255)));
    assert_eq!(editor.cache().stats().evictions, 0);
}

#[tokio::test]
async fn test_bounded_cache_drops_deleted_images() {
    let config = EditorConfig {
        max_cached_images: Some(1),
        ..EditorConfig::default().with_size(300, 300)
    };
    let mut editor = Editor::new(config).expect("editor");
    let red = editor.drop_image(&solid_png(4, 4, Color::rgb(255, 0, 0)));
    editor.drop_image(&solid_png(4, 4, Color::rgb(0, 0, 255)));
    editor.settle().await;
    assert_eq!(editor.cache().len(), 2);

    assert!(editor.delete(&red));
    editor.render();
    assert_eq!(editor.cache().len(), 1);
    assert_eq!(editor.cache().stats().evictions, 1);
    assert_eq!(editor.surface().pixel(100, 100), Some(Color::rgb(0, 0, 255)));
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_export_hides_and_restores_selection() {
    let mut editor = editor(300, 300);
    let id = editor.drop_image(&solid_png(4, 4, Color::rgb(255, 0, 0)));
    editor.settle().await;
    editor.render();

    // Top-left corner handle is painted over the image while selected.
    assert_eq!(editor.surface().pixel(50, 50), Some(Color::WHITE));

    let png = editor.export_png().expect("export");
    let exported = Bitmap::decode(&png).expect("decodes");
    let corner = exported.pixmap().pixel(50, 50).expect("pixel");
    assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 0, 0));

    assert_eq!(editor.document().selected(), Some(&id));
    assert_eq!(editor.surface().pixel(50, 50), Some(Color::WHITE));
}

#[tokio::test]
async fn test_download_writes_fixed_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut editor = editor(64, 48);
    editor.set_background("#0000ff");

    let path = editor.download(dir.path()).expect("download");
    assert_eq!(path, dir.path().join(EXPORT_FILE_NAME));
    let bitmap = Bitmap::decode(&std::fs::read(&path).expect("reads")).expect("decodes");
    assert_eq!((bitmap.width(), bitmap.height()), (64, 48));

    let url = editor.export_data_url().expect("data url");
    assert!(url.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_render_document_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = dir.path().join("green.png");
    std::fs::write(&image_path, solid_png(2, 2, Color::rgb(0, 255, 0))).expect("writes");

    let mut doc = Document::new();
    doc.add_layer(Layer::image(image_path.display().to_string(), 0.0, 0.0).with_size(20.0, 20.0));
    doc.add_layer(Layer::image("missing.png", 30.0, 0.0).with_size(20.0, 20.0));
    let doc_path = dir.path().join("meme.json");
    doc.save_to_path(&doc_path).expect("saves");

    let output = dir.path().join("out.png");
    let config = EditorConfig::default().with_size(60, 30);
    let written = render_document(config, &doc_path, &output)
        .await
        .expect("renders");
    assert_eq!(written, output);

    let bitmap = Bitmap::decode(&std::fs::read(&output).expect("reads")).expect("decodes");
    let inside = bitmap.pixmap().pixel(10, 10).expect("pixel");
    assert_eq!((inside.red(), inside.green(), inside.blue()), (0, 255, 0));
    let skipped = bitmap.pixmap().pixel(40, 10).expect("pixel");
    assert_eq!((skipped.red(), skipped.green(), skipped.blue()), (255, 255, 255));
}

#[tokio::test]
async fn test_render_document_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = render_document(
        EditorConfig::default(),
        &dir.path().join("nope.json"),
        &dir.path().join("out.png"),
    )
    .await;
    assert!(matches!(result, Err(EditorError::Layer(_))));
}
