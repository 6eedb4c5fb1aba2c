//! Canvas state: a fixed page size plus its layers.

use serde::{Deserialize, Serialize};

use crate::layer::{CanvasLayer, LayerId, LayerKind, DEFAULT_FONT_SIZE, UNRANKED};
use crate::{CanvasError, CanvasResult};

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1080;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// A canvas page and the layers placed on it.
///
/// The order of `layers` is insertion order and is not authoritative:
/// `z_index` defines paint order. Use [`CanvasState::paint_order`] wherever
/// order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// All layers on the page.
    #[serde(default)]
    pub layers: Vec<CanvasLayer>,
}

impl CanvasState {
    /// Create an empty canvas with the given page size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&CanvasLayer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Get the number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Check if the canvas has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers sorted back-to-front by `z_index`.
    ///
    /// The sort is stable, so layers sharing a rank keep insertion order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&CanvasLayer> {
        let mut ordered: Vec<_> = self.layers.iter().collect();
        ordered.sort_by_key(|l| l.z_index);
        ordered
    }

    /// Check that `z_index` values are exactly `0..n` with no gaps or
    /// duplicates.
    #[must_use]
    pub fn has_dense_z_order(&self) -> bool {
        let mut ranks: Vec<u32> = self.layers.iter().map(|l| l.z_index).collect();
        ranks.sort_unstable();
        ranks
            .iter()
            .enumerate()
            .all(|(i, &rank)| usize::try_from(rank).is_ok_and(|r| r == i))
    }

    /// A copy of this canvas with editor defaults filled in: text layers
    /// without a font size get 48, layers without a `zIndex` take their
    /// position in the collection.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let mut layer = layer.clone();
                if layer.kind == LayerKind::Text && layer.font_size.is_none() {
                    layer.font_size = Some(DEFAULT_FONT_SIZE);
                }
                if layer.z_index == UNRANKED {
                    layer.z_index = u32::try_from(index).unwrap_or(UNRANKED);
                }
                layer
            })
            .collect();
        self.with_layers(layers)
    }

    /// Same page size, different layers.
    #[must_use]
    pub(crate) fn with_layers(&self, layers: Vec<CanvasLayer>) -> Self {
        Self {
            width: self.width,
            height: self.height,
            layers,
        }
    }

    /// Build a canvas whose layers are `ordered` back-to-front, with ranks
    /// rewritten to `0..n`.
    #[must_use]
    pub(crate) fn reindexed(&self, ordered: Vec<CanvasLayer>) -> Self {
        self.with_layers(
            ordered
                .into_iter()
                .enumerate()
                .map(|(rank, layer)| layer.with_z_index(u32::try_from(rank).unwrap_or(UNRANKED)))
                .collect(),
        )
    }

    /// Serialize the canvas to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a canvas from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::Serialization)
    }
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}
