//! Export Integration Tests
//!
//! End-to-end path from an encoded image through the cache, the painter and
//! PNG export.

use memeforge_core::{Color, Document, Layer};
use memeforge_renderer::{
    bytes_to_data_url, encode_png, png_data_url, write_png, Bitmap, EntryState, ImageCache,
    RasterSurface, Renderer, Surface,
};

/// A solid-color PNG of the given size.
fn solid_png(width: u32, height: u32, color: Color) -> Vec<u8> {
    let mut surface = RasterSurface::new(width, height).expect("surface");
    surface.fill_background(color);
    encode_png(&surface).expect("png")
}

#[tokio::test]
async fn test_data_url_image_through_cache_to_png() {
    let url = bytes_to_data_url(&solid_png(8, 6, Color::rgb(200, 0, 0)));
    assert!(url.starts_with("data:image/png;base64,"));

    let mut cache = ImageCache::new();
    assert!(cache.ensure(&url));
    assert!(!cache.ensure(&url), "second request is a no-op");
    assert_eq!(cache.settle().await, 1);
    assert!(matches!(cache.state(&url), Some(EntryState::Ready(_))));

    let mut doc = Document::new();
    doc.add_layer(Layer::image(url.clone(), 2.0, 2.0));
    doc.clear_selection();

    let mut surface = RasterSurface::new(16, 16).expect("surface");
    Renderer::default().render(&mut surface, &doc, &cache);
    let png = encode_png(&surface).expect("png");

    let exported = Bitmap::decode(&png).expect("decodes");
    assert_eq!((exported.width(), exported.height()), (16, 16));
    let inside = exported.pixmap().pixel(5, 5).expect("pixel");
    assert_eq!((inside.red(), inside.green(), inside.blue()), (200, 0, 0));
    let outside = exported.pixmap().pixel(12, 12).expect("pixel");
    assert_eq!((outside.red(), outside.green(), outside.blue()), (255, 255, 255));
}

#[tokio::test]
async fn test_undecodable_image_is_skipped() {
    let broken = "data:image/png;base64,bm90IGFuIGltYWdl";
    let mut cache = ImageCache::new();
    cache.ensure(broken);
    cache.settle().await;
    assert!(matches!(cache.state(broken), Some(EntryState::Failed)));
    assert!(!cache.ensure(broken), "failures are not retried");

    let mut with_broken = Document::new();
    with_broken.add_layer(Layer::image(broken, 0.0, 0.0).with_size(10.0, 10.0));
    with_broken.clear_selection();

    let mut a = RasterSurface::new(12, 12).expect("surface");
    let mut b = RasterSurface::new(12, 12).expect("surface");
    let mut renderer = Renderer::default();
    renderer.render(&mut a, &with_broken, &cache);
    renderer.render(&mut b, &Document::new(), &cache);
    assert_eq!(a.pixmap().data(), b.pixmap().data());
}

#[test]
fn test_background_color_exported() {
    let mut doc = Document::new();
    doc.set_background("#00ff00");
    let mut surface = RasterSurface::new(4, 4).expect("surface");
    Renderer::default().render(&mut surface, &doc, &std::collections::HashMap::new());

    let png = encode_png(&surface).expect("png");
    let url = png_data_url(&png);
    assert!(url.starts_with("data:image/png;base64,"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("meme.png");
    write_png(&path, &png).expect("writes");
    let reread = Bitmap::decode(&std::fs::read(&path).expect("reads")).expect("decodes");
    let pixel = reread.pixmap().pixel(0, 0).expect("pixel");
    assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (0, 255, 0));
}
