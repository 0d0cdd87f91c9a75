//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while compositing or exporting a scene.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render target could not be prepared.
    #[error("Render target not ready: {0}")]
    NotReady(String),

    /// A scene resource failed to decode or load.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding the composited frame failed.
    #[error("Export encoding failed: {0}")]
    Export(String),
}
