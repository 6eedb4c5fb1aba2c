//! Image layer decoding.
//!
//! Image layers carry their pixels inline as `data:` URIs. This module turns
//! such a URI into a premultiplied [`tiny_skia::Pixmap`] ready to draw.

use base64::Engine;
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Decode the payload of a `data:` URI.
///
/// Supports both `;base64` and percent-encoded payloads, e.g.
/// `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is not a data URI or its
/// payload is malformed.
pub fn data_uri_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

/// Decode a data URI into a premultiplied RGBA pixmap.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI or image data cannot be
/// decoded.
pub fn decode_data_uri(uri: &str) -> RenderResult<Pixmap> {
    let bytes = data_uri_bytes(uri)?;
    decode_bytes(&bytes)
}

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP, BMP) into a pixmap.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the bytes cannot be decoded.
pub fn decode_bytes(bytes: &[u8]) -> RenderResult<Pixmap> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| RenderError::Resource("Image has zero size".to_string()))?;

    let mut data = rgba.into_raw();
    premultiply(&mut data);
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Resource("Pixel buffer size mismatch".to_string()))
}

fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let alpha = u16::from(px[3]);
        for channel in &mut px[..3] {
            // (c * a + 127) / 255 never exceeds 255.
            #[allow(clippy::cast_possible_truncation)]
            {
                *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
            }
        }
    }
}

/// Percent-decoding over raw bytes.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}
