//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading, drawing or exporting.
///
/// None of these reach the paint path: a bitmap that fails to load is
/// simply absent from the cache.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Image source could not be fetched or parsed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Drawing surface could not be created.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Font data could not be parsed.
    #[error("Invalid font: {0}")]
    Font(String),

    /// Encoding the painted surface failed.
    #[error("Export failed: {0}")]
    Export(String),
}
