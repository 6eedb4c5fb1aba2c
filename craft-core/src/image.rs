//! Embedding user-supplied image files as inline data URIs.
//!
//! Image layers never reference external URLs: the file is read once and
//! carried inside the canvas as `data:{mime};base64,...`.

use std::path::Path;

use base64::Engine;

use crate::{CanvasError, CanvasResult};

/// An image file encoded for embedding in an image layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    mime: &'static str,
    data_uri: String,
}

impl EmbeddedImage {
    /// Encode raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedImage`] if the bytes are not a
    /// recognised raster format.
    pub fn from_bytes(bytes: &[u8]) -> CanvasResult<Self> {
        let mime = sniff_mime(bytes).ok_or_else(|| {
            CanvasError::UnsupportedImage(format!(
                "unrecognised header ({} bytes)",
                bytes.len()
            ))
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            mime,
            data_uri: format!("data:{mime};base64,{encoded}"),
        })
    }

    /// Read and encode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ImageRead`] if the file cannot be read, or
    /// [`CanvasError::UnsupportedImage`] if it is not a recognised format.
    pub async fn read(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_bytes(&bytes)
    }

    /// MIME type detected from the file header.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// The `data:` URI.
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Consume into the `data:` URI.
    #[must_use]
    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// Detect an image MIME type from magic bytes.
#[must_use]
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if data.starts_with(b"BM") && data.len() > 14 {
        return Some("image/bmp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_bytes() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(PNG_1X1)
            .expect("valid base64")
    }

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(sniff_mime(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\x00\x00\x00\x00WEBP"), Some("image/webp"));
        assert_eq!(sniff_mime(b"plain text"), None);
        assert_eq!(sniff_mime(&[]), None);
    }

    #[test]
    fn test_from_bytes_builds_data_uri() {
        let image = EmbeddedImage::from_bytes(&png_bytes()).expect("png");
        assert_eq!(image.mime(), "image/png");
        assert_eq!(image.data_uri(), format!("data:image/png;base64,{PNG_1X1}"));
    }

    #[test]
    fn test_from_bytes_rejects_unknown() {
        let result = EmbeddedImage::from_bytes(b"not an image");
        assert!(matches!(result, Err(CanvasError::UnsupportedImage(_))));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let result = EmbeddedImage::read("/definitely/not/here.png").await;
        assert!(matches!(result, Err(CanvasError::ImageRead(_))));
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, png_bytes()).expect("write");

        let image = EmbeddedImage::read(&path).await.expect("read");
        assert!(image.data_uri().starts_with("data:image/png;base64,"));
    }
}
