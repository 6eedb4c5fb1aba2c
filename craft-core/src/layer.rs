//! Canvas layers - the building blocks of templates.

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// Prefix used for generated layer ids.
pub const LAYER_ID_PREFIX: &str = "layer";

/// Font size applied to text layers that do not carry one.
pub const DEFAULT_FONT_SIZE: f32 = 48.0;

/// Smallest font size a patch can set.
pub const MIN_FONT_SIZE: f32 = 4.0;

/// Text color applied to text layers that do not carry one.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Rank carried by layers that were stored without a `zIndex`.
///
/// Replaced by the layer's positional index when the canvas is opened in
/// the editor.
pub const UNRANKED: u32 = u32::MAX;

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(generate_id(LAYER_ID_PREFIX))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type of content a layer contains. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// A text block.
    Text,
    /// An embedded raster image.
    Image,
}

/// A single visual element on a canvas.
///
/// Both the text and the image attribute sets are structurally present;
/// only the one matching [`LayerKind`] is ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasLayer {
    /// Unique identifier.
    pub id: LayerId,
    /// Layer content type.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Left edge in canvas units.
    pub x: f32,
    /// Top edge in canvas units.
    pub y: f32,
    /// Width in canvas units.
    pub width: f32,
    /// Height in canvas units.
    pub height: f32,
    /// Rotation in degrees about the layer center.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity from 0.0 (invisible) to 1.0.
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    /// Paint order rank, ascending back-to-front.
    #[serde(default = "unranked")]
    pub z_index: u32,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Font size in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Text color as a CSS color string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Embedded image reference (data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

fn full_opacity() -> f32 {
    1.0
}

fn unranked() -> u32 {
    UNRANKED
}

impl CanvasLayer {
    /// Create a text layer with the editor's defaults: "New text",
    /// 400x80 at (100, 100), 48px black.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(),
            kind: LayerKind::Text,
            x: 100.0,
            y: 100.0,
            width: 400.0,
            height: 80.0,
            rotation: 0.0,
            opacity: 1.0,
            z_index: 0,
            content: Some(content.into()),
            font_size: Some(DEFAULT_FONT_SIZE),
            color: Some(DEFAULT_TEXT_COLOR.to_string()),
            src: None,
        }
    }

    /// Create an image layer with the editor's defaults: 400x300 at (80, 80).
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(),
            kind: LayerKind::Image,
            x: 80.0,
            y: 80.0,
            width: 400.0,
            height: 300.0,
            rotation: 0.0,
            opacity: 1.0,
            z_index: 0,
            content: None,
            font_size: None,
            color: None,
            src: Some(src.into()),
        }
    }

    /// Set the paint order rank.
    #[must_use]
    pub fn with_z_index(mut self, z_index: u32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Set position and size.
    #[must_use]
    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// Check if this is a text layer.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == LayerKind::Text
    }

    /// Font size to draw with, falling back to the default.
    #[must_use]
    pub fn effective_font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Text color to draw with, falling back to black.
    #[must_use]
    pub fn effective_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)
    }

    /// Center of the layer's bounding box.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Merge the fields set in `patch` into this layer.
    ///
    /// Unset fields are left untouched. `id`, `kind`, and `z_index` are not
    /// patchable.
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(font_size) = patch.font_size {
            self.font_size = Some(font_size.max(MIN_FONT_SIZE));
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
        if let Some(src) = &patch.src {
            self.src = Some(src.clone());
        }
    }
}

/// A partial update to a layer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    /// New left edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// New opacity, clamped to 0.0..=1.0 when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// New text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New font size, floored at [`MIN_FONT_SIZE`] when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// New text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl LayerPatch {
    /// A patch that moves a layer.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// A patch that replaces a layer's text.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Check if the patch sets no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge `newer` on top of this patch, last value wins per field.
    pub fn merge(&mut self, newer: Self) {
        self.x = newer.x.or(self.x);
        self.y = newer.y.or(self.y);
        self.width = newer.width.or(self.width);
        self.height = newer.height.or(self.height);
        self.rotation = newer.rotation.or(self.rotation);
        self.opacity = newer.opacity.or(self.opacity);
        self.content = newer.content.or(self.content.take());
        self.font_size = newer.font_size.or(self.font_size);
        self.color = newer.color.or(self.color.take());
        self.src = newer.src.or(self.src.take());
    }
}
