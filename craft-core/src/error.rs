//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Editing itself never fails: operations on missing layers are no-ops.
/// These errors come from the edges, where image files are read and
/// canvases are (de)serialized.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Reading an image file failed.
    #[error("Failed to read image: {0}")]
    ImageRead(#[from] std::io::Error),

    /// The image data is not a recognised raster format.
    #[error("Unsupported image data: {0}")]
    UnsupportedImage(String),

    /// Canvas serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
