//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Caller-supplied data was rejected (non-image upload, malformed
    /// color, zero-sized canvas).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The background list provider supplied no images.
    #[error("Background list is empty")]
    EmptyBackgroundList,

    /// Operation targeted a layer of the wrong kind.
    #[error("Layer {0} is not a {1} layer")]
    WrongLayerKind(String, &'static str),
}
