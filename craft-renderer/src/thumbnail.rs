//! Canvas thumbnails.
//!
//! A canvas is rasterized back-to-front onto one [`tiny_skia::Pixmap`]
//! scaled to fit a maximum dimension. Text layers go through a small
//! per-layer SVG rendered by resvg; image layers are decoded with the
//! `image` crate and drawn as pixmaps. A layer that fails to render is
//! skipped, never the whole thumbnail.

use std::fmt::Write;
use std::sync::Arc;

use base64::Engine;
use craft_core::{CanvasLayer, CanvasState, LayerKind};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::image::decode_data_uri;

/// Default longest side of a thumbnail in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 400;

/// Thumbnail appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    /// Longest side used by [`ThumbnailRenderer::render_default`].
    pub max_dimension: u32,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            background: [255, 255, 255, 255],
        }
    }
}

/// An encoded thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

impl Thumbnail {
    /// The thumbnail as a `data:image/png;base64,...` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Scale factor and output size for a canvas: never upscales, and each
/// side is at least one pixel.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn output_size(canvas: &CanvasState, max_dimension: u32) -> (f32, u32, u32) {
    let longest = canvas.width.max(canvas.height);
    let scale = if longest > 0 {
        (max_dimension as f32 / longest as f32).min(1.0)
    } else {
        1.0
    };
    let width = ((canvas.width as f32 * scale).round() as u32).max(1);
    let height = ((canvas.height as f32 * scale).round() as u32).max(1);
    (scale, width, height)
}

/// Rasterizes canvases into PNG thumbnails.
#[derive(Clone)]
pub struct ThumbnailRenderer {
    config: ThumbnailConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for ThumbnailRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailRenderer")
            .field("config", &self.config)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for ThumbnailRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailRenderer {
    /// Create a renderer using the system fonts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ThumbnailConfig::default())
    }

    /// Create a renderer with a custom configuration.
    #[must_use]
    pub fn with_config(config: ThumbnailConfig) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!("Loaded {} font faces for thumbnails", fontdb.len());
        Self {
            config,
            fontdb: Arc::new(fontdb),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Render `canvas` scaled so its longest side is at most
    /// `max_dimension`.
    ///
    /// Returns `None` if no raster surface can be allocated or PNG encoding
    /// fails. Layers that cannot be drawn are skipped.
    pub async fn render(&self, canvas: &CanvasState, max_dimension: u32) -> Option<Thumbnail> {
        match self.rasterize(canvas, max_dimension).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                tracing::warn!("Thumbnail unavailable: {e}");
                None
            }
        }
    }

    /// Render at the configured maximum dimension.
    pub async fn render_default(&self, canvas: &CanvasState) -> Option<Thumbnail> {
        self.render(canvas, self.config.max_dimension).await
    }

    async fn rasterize(&self, canvas: &CanvasState, max_dimension: u32) -> RenderResult<Thumbnail> {
        let (scale, width, height) = output_size(canvas, max_dimension);
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Surface(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        let [r, g, b, a] = self.config.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        for layer in canvas.paint_order() {
            if layer.opacity <= 0.0 {
                continue;
            }
            let drawn = match layer.kind {
                LayerKind::Text => self.draw_text(&mut pixmap, layer, scale),
                LayerKind::Image => draw_image(&mut pixmap, layer, scale).await,
            };
            if let Err(e) = drawn {
                tracing::warn!("Skipping layer {} in thumbnail: {e}", layer.id);
            }
        }

        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
        Ok(Thumbnail { width, height, png })
    }

    fn draw_text(&self, pixmap: &mut Pixmap, layer: &CanvasLayer, scale: f32) -> RenderResult<()> {
        let svg = text_layer_svg(layer, scale, pixmap.width(), pixmap.height());
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        let tree =
            usvg::Tree::from_str(&svg, &options).map_err(|e| RenderError::Svg(e.to_string()))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        Ok(())
    }
}

/// Render with default settings.
pub async fn render_thumbnail(canvas: &CanvasState, max_dimension: u32) -> Option<Thumbnail> {
    ThumbnailRenderer::new().render(canvas, max_dimension).await
}

/// A full-surface SVG drawing one text layer: centered on the layer's
/// scaled box, rotated about its center, clipped to the box width.
fn text_layer_svg(layer: &CanvasLayer, scale: f32, width: u32, height: u32) -> String {
    let (cx, cy) = layer.center();
    let (cx, cy) = (cx * scale, cy * scale);
    let draw_w = layer.width * scale;
    let font_size = layer.effective_font_size() * scale;
    let clip_h = (layer.height * scale).max(font_size * 2.0);
    let content = layer.content.as_deref().unwrap_or_default();

    let mut svg = String::with_capacity(512 + content.len());
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    let _ = write!(
        svg,
        "<defs><clipPath id=\"box\"><rect x=\"{}\" y=\"{}\" width=\"{draw_w}\" height=\"{clip_h}\"/></clipPath></defs>",
        -draw_w / 2.0,
        -clip_h / 2.0,
    );
    let _ = write!(
        svg,
        "<g transform=\"translate({cx} {cy}) rotate({})\" opacity=\"{}\">",
        layer.rotation, layer.opacity,
    );
    let _ = write!(
        svg,
        "<text x=\"0\" y=\"0\" font-size=\"{font_size}\" fill=\"{}\" font-family=\"sans-serif\" text-anchor=\"middle\" dominant-baseline=\"central\" clip-path=\"url(#box)\">{}</text>",
        escape_xml(layer.effective_color()),
        escape_xml(content),
    );
    svg.push_str("</g></svg>");
    svg
}

async fn draw_image(pixmap: &mut Pixmap, layer: &CanvasLayer, scale: f32) -> RenderResult<()> {
    let src = layer
        .src
        .clone()
        .ok_or_else(|| RenderError::Resource("Image layer has no source".to_string()))?;
    let image = decode_off_executor(src).await?;

    let draw_w = layer.width * scale;
    let draw_h = layer.height * scale;
    if draw_w <= 0.0 || draw_h <= 0.0 {
        return Ok(());
    }
    let (cx, cy) = layer.center();

    #[allow(clippy::cast_precision_loss)]
    let transform = Transform::from_translate(cx * scale, cy * scale)
        .pre_rotate(layer.rotation)
        .pre_translate(-draw_w / 2.0, -draw_h / 2.0)
        .pre_scale(
            draw_w / image.width() as f32,
            draw_h / image.height() as f32,
        );
    let paint = PixmapPaint {
        opacity: layer.opacity.clamp(0.0, 1.0),
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    Ok(())
}

/// Decode on the blocking pool when a runtime is available.
async fn decode_off_executor(src: String) -> RenderResult<Pixmap> {
    if tokio::runtime::Handle::try_current().is_err() {
        return decode_data_uri(&src);
    }
    tokio::task::spawn_blocking(move || decode_data_uri(&src))
        .await
        .map_err(|e| RenderError::Resource(format!("Decode task failed: {e}")))?
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
