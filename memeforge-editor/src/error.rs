//! Editor error types.

use memeforge_core::LayerError;
use memeforge_renderer::RenderError;
use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced by the editor shell.
///
/// Only I/O boundaries produce these: setup, document loading, export and
/// description requests. Pointer routing and painting never fail.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Surface allocation, font loading or PNG encoding failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Loading or saving a layer document failed.
    #[error("Document error: {0}")]
    Layer(#[from] LayerError),

    /// The description service failed or answered with garbage.
    #[error("Description service error: {0}")]
    Description(String),

    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for EditorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Description(e.to_string())
    }
}
