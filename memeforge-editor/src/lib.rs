//! # Memeforge Editor
//!
//! Editor shell for the memeforge layer canvas.
//!
//! Composes the layer store and interaction engine from `memeforge-core`
//! with the image cache and painter from `memeforge-renderer`, and adds
//! image intake, the image description service and PNG export.
//!
//! ## Usage
//!
//! ```bash
//! memeforge render --document meme.json --output meme.png --font Impact.ttf
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                    Editor                     │
//! │  drop_image · add_text · pointer · export_png │
//! ├───────────────┬───────────────┬───────────────┤
//! │   Document    │  ImageCache   │ Description-  │
//! │ + Interaction │  (decode      │ Queue         │
//! │   Engine      │   tasks)      │ (HTTP tasks)  │
//! ├───────────────┴───────┬───────┴───────────────┤
//! │  Renderer → RasterSurface → PNG               │
//! └───────────────────────┴───────────────────────┘
//! ```
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `EditorConfig` - Canvas size, drop defaults, font and description endpoint
//! - `Editor` - The shell; background results are applied by `pump`/`settle`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod description;
pub mod editor;
pub mod error;

use std::path::{Path, PathBuf};

pub use config::{CliArgs, Command, EditorConfig, RenderArgs, DEFAULT_DROP_POSITION};
pub use description::{DescriptionQueue, DescriptionService, HttpDescriptionService};
pub use editor::{Editor, EXPORT_FILE_NAME};
pub use error::{EditorError, EditorResult};

/// Paint a saved layer document to a PNG file.
///
/// Loads the document, waits for every image to decode, paints it without
/// selection decorations and writes the result to `output`.
///
/// # Errors
///
/// Returns an error if the editor cannot be created, the document cannot be
/// loaded, or the PNG cannot be encoded or written.
pub async fn render_document(
    config: EditorConfig,
    document: &Path,
    output: &Path,
) -> EditorResult<PathBuf> {
    let mut editor = Editor::new(config)?;
    editor.open(document)?;
    editor.settle().await;

    let failed = editor.cache().stats().failed;
    if failed > 0 {
        tracing::warn!("{failed} image(s) could not be loaded and were skipped");
    }

    let png = editor.export_png()?;
    memeforge_renderer::write_png(output, &png)?;
    Ok(output.to_path_buf())
}
