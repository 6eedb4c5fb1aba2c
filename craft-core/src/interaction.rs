//! Drag and resize coalescing.
//!
//! Pointer events arrive far faster than frames are drawn. A
//! [`LayerInteraction`] folds every geometry event into one pending
//! [`LayerPatch`] and asks its [`FrameScheduler`] for a single frame. When
//! that frame fires the patch is applied to the editor once.
//!
//! ```text
//!  drag  drag  drag  resize        frame
//!   │     │     │     │              │
//!   ▼     ▼     ▼     ▼              ▼
//! ┌──────────────────────┐   ┌──────────────┐
//! │ pending patch (merge)│──▶│ update_layer │
//! └──────────────────────┘   └──────────────┘
//! ```

use crate::editor::CanvasEditor;
use crate::layer::{LayerId, LayerPatch};

/// Smallest width or height a resize may produce.
pub const MIN_LAYER_SIZE: f32 = 40.0;

/// Handle for a requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Source of next-frame callbacks.
pub trait FrameScheduler {
    /// Request a callback on the next frame boundary.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a previously requested callback. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// A frame scheduler pumped by the host once per rendered frame.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next: u64,
    requested: Vec<FrameToken>,
}

impl FrameQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross a frame boundary: return every outstanding request, in request
    /// order, and clear the queue.
    pub fn advance(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.requested)
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.requested.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next);
        self.next += 1;
        self.requested.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.requested.retain(|t| *t != token);
    }
}

/// Coalesces pointer-driven geometry updates for one layer.
#[derive(Debug)]
pub struct LayerInteraction {
    layer_id: LayerId,
    pending: Option<LayerPatch>,
    scheduled: Option<FrameToken>,
    torn_down: bool,
}

impl LayerInteraction {
    /// Start tracking interactions on `layer_id`.
    #[must_use]
    pub fn new(layer_id: LayerId) -> Self {
        Self {
            layer_id,
            pending: None,
            scheduled: None,
            torn_down: false,
        }
    }

    /// The layer this interaction drives.
    #[must_use]
    pub fn layer_id(&self) -> &LayerId {
        &self.layer_id
    }

    /// Whether a patch is waiting for its frame.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The patch accumulated so far.
    #[must_use]
    pub fn pending(&self) -> Option<&LayerPatch> {
        self.pending.as_ref()
    }

    /// Drag or resize start: select the layer.
    pub fn select(&self, editor: &mut CanvasEditor) {
        if !self.torn_down {
            editor.select_layer(Some(self.layer_id.clone()));
        }
    }

    /// Record a drag to `(x, y)`.
    pub fn drag(&mut self, x: f32, y: f32, scheduler: &mut impl FrameScheduler) {
        self.schedule(LayerPatch::position(x, y), scheduler);
    }

    /// Record a resize. Dimensions are floored at [`MIN_LAYER_SIZE`].
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        x: f32,
        y: f32,
        scheduler: &mut impl FrameScheduler,
    ) {
        self.schedule(
            LayerPatch {
                width: Some(width.max(MIN_LAYER_SIZE)),
                height: Some(height.max(MIN_LAYER_SIZE)),
                ..LayerPatch::position(x, y)
            },
            scheduler,
        );
    }

    /// Frame callback. Applies the accumulated patch if `token` is the frame
    /// this interaction is waiting for; returns whether anything was applied.
    pub fn on_frame(&mut self, token: FrameToken, editor: &mut CanvasEditor) -> bool {
        if self.torn_down || self.scheduled != Some(token) {
            return false;
        }
        self.scheduled = None;
        match self.pending.take() {
            Some(patch) => {
                editor.update_layer(&self.layer_id, &patch);
                true
            }
            None => false,
        }
    }

    /// Stop tracking: cancel the scheduled frame and drop the pending patch.
    pub fn teardown(&mut self, scheduler: &mut impl FrameScheduler) {
        if let Some(token) = self.scheduled.take() {
            scheduler.cancel_frame(token);
        }
        if self.pending.take().is_some() {
            tracing::debug!("Dropped unflushed patch for layer {}", self.layer_id);
        }
        self.torn_down = true;
    }

    fn schedule(&mut self, patch: LayerPatch, scheduler: &mut impl FrameScheduler) {
        if self.torn_down {
            return;
        }
        match &mut self.pending {
            Some(pending) => pending.merge(patch),
            None => self.pending = Some(patch),
        }
        if self.scheduled.is_none() {
            self.scheduled = Some(scheduler.request_frame());
        }
    }
}
