//! PNG export of a painted surface.

use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::image::encode_data_url;
use crate::raster::RasterSurface;

/// Encode the surface's current pixels as PNG bytes.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn encode_png(surface: &RasterSurface) -> RenderResult<Vec<u8>> {
    surface
        .pixmap()
        .encode_png()
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
}

/// Wrap PNG bytes in a `data:image/png;base64,...` URL.
#[must_use]
pub fn png_data_url(png: &[u8]) -> String {
    encode_data_url("image/png", png)
}

/// Write PNG bytes to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_png(path: impl AsRef<Path>, png: &[u8]) -> RenderResult<()> {
    let path = path.as_ref();
    std::fs::write(path, png)
        .map_err(|e| RenderError::Export(format!("{}: {e}", path.display())))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), png.len());
    Ok(())
}
