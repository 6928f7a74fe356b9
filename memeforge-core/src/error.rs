//! Error types for layer and document operations.

use thiserror::Error;

/// Result type for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

/// Errors that can occur in layer and document operations.
///
/// Pointer handling and painting never produce these; they only surface at
/// load/save boundaries.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Layer not found in the document.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// Two layers in a loaded document share the same id.
    #[error("Duplicate layer id: {0}")]
    DuplicateId(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing a document file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
