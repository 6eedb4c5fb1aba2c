//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
///
/// These stay inside the crate's public thumbnail API, which reports
/// failure as `None` or by skipping the offending layer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The raster surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// An image reference could not be loaded or decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// A generated SVG fragment failed to parse.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Final image encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}
