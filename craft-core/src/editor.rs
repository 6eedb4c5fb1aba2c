//! The canvas editor state machine.
//!
//! [`CanvasEditor`] is the single owner of the live [`CanvasState`] and the
//! current selection. Every operation computes a new canvas and swaps it in
//! whole; nothing outside the editor mutates layers in place.

use std::path::Path;

use crate::image::EmbeddedImage;
use crate::layer::{CanvasLayer, LayerId, LayerKind, LayerPatch};
use crate::CanvasState;

/// Content given to freshly added text layers.
pub const NEW_TEXT_CONTENT: &str = "New text";

/// Owns the canvas being edited and the selected layer.
#[derive(Debug, Clone, Default)]
pub struct CanvasEditor {
    canvas: CanvasState,
    selected: Option<LayerId>,
}

impl CanvasEditor {
    /// Start editing a blank default canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing a copy of `source`, with editor defaults filled in.
    #[must_use]
    pub fn from_canvas(source: &CanvasState) -> Self {
        Self {
            canvas: source.normalized(),
            selected: None,
        }
    }

    /// Reseed the editor from `source`, or a blank canvas when `None`.
    /// Clears the selection.
    pub fn initialize(&mut self, source: Option<&CanvasState>) {
        *self = source.map_or_else(Self::new, Self::from_canvas);
    }

    /// The current canvas.
    #[must_use]
    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    /// Consume the editor, returning its canvas.
    #[must_use]
    pub fn into_canvas(self) -> CanvasState {
        self.canvas
    }

    /// The selected layer id, which may not name an existing layer.
    #[must_use]
    pub fn selected_layer_id(&self) -> Option<&LayerId> {
        self.selected.as_ref()
    }

    /// The selected layer, if the selection names one.
    #[must_use]
    pub fn selected_layer(&self) -> Option<&CanvasLayer> {
        self.selected.as_ref().and_then(|id| self.canvas.layer(id))
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&CanvasLayer> {
        self.canvas.layer(id)
    }

    /// Set the selection. The id is not validated.
    pub fn select_layer(&mut self, id: Option<LayerId>) {
        self.selected = id;
    }

    /// Merge `patch` into the layer with `id` and select it.
    ///
    /// Missing layers are left alone, but the selection still moves.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) {
        if self.canvas.layer(id).is_some() {
            let layers = self
                .canvas
                .layers
                .iter()
                .map(|layer| {
                    let mut layer = layer.clone();
                    if &layer.id == id {
                        layer.apply(patch);
                    }
                    layer
                })
                .collect();
            self.canvas = self.canvas.with_layers(layers);
        }
        self.selected = Some(id.clone());
    }

    /// Append a default text layer on top of the stack.
    pub fn add_text_layer(&mut self) -> LayerId {
        self.push_on_top(CanvasLayer::text(NEW_TEXT_CONTENT))
    }

    /// Append an image layer for an already encoded image.
    pub fn insert_image_layer(&mut self, image: EmbeddedImage) -> LayerId {
        self.push_on_top(CanvasLayer::image(image.into_data_uri()))
    }

    /// Read an image file and append it as an image layer.
    ///
    /// Unreadable or unrecognised files add nothing; the failure is logged
    /// and `None` is returned.
    pub async fn add_image_layer(&mut self, path: impl AsRef<Path>) -> Option<LayerId> {
        let path = path.as_ref();
        match EmbeddedImage::read(path).await {
            Ok(image) => Some(self.insert_image_layer(image)),
            Err(e) => {
                tracing::warn!("Skipping image layer from {}: {e}", path.display());
                None
            }
        }
    }

    /// Read an image file into the `src` of an existing image layer.
    ///
    /// Returns `false` and leaves the canvas untouched when the layer is
    /// missing, is not an image layer, or the file cannot be used.
    pub async fn replace_image(&mut self, id: &LayerId, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !self.layer(id).is_some_and(|l| l.kind == LayerKind::Image) {
            tracing::debug!("No image layer {id} to replace");
            return false;
        }
        match EmbeddedImage::read(path).await {
            Ok(image) => {
                let patch = LayerPatch {
                    src: Some(image.into_data_uri()),
                    ..LayerPatch::default()
                };
                self.update_layer(id, &patch);
                true
            }
            Err(e) => {
                tracing::warn!("Keeping image of {id}, cannot use {}: {e}", path.display());
                false
            }
        }
    }

    /// Delete a layer, reindex the rest densely, and clear the selection.
    pub fn remove_layer(&mut self, id: &LayerId) {
        let remaining: Vec<CanvasLayer> = self
            .canvas
            .paint_order()
            .into_iter()
            .filter(|l| &l.id != id)
            .cloned()
            .collect();
        self.canvas = self.canvas.reindexed(remaining);
        self.selected = None;
    }

    /// Move a layer to the top of the paint order.
    pub fn bring_to_front(&mut self, id: &LayerId) {
        self.relocate(id, Placement::Front);
    }

    /// Move a layer to the bottom of the paint order.
    pub fn send_to_back(&mut self, id: &LayerId) {
        self.relocate(id, Placement::Back);
    }

    fn push_on_top(&mut self, layer: CanvasLayer) -> LayerId {
        let rank = u32::try_from(self.canvas.layer_count()).unwrap_or(u32::MAX);
        let layer = layer.with_z_index(rank);
        let id = layer.id.clone();

        let mut layers = self.canvas.layers.clone();
        layers.push(layer);
        self.canvas = self.canvas.with_layers(layers);
        tracing::debug!("Added layer {id} at z-index {rank}");
        id
    }

    fn relocate(&mut self, id: &LayerId, placement: Placement) {
        let mut ordered: Vec<CanvasLayer> =
            self.canvas.paint_order().into_iter().cloned().collect();
        let Some(idx) = ordered.iter().position(|l| &l.id == id) else {
            return;
        };
        let layer = ordered.remove(idx);
        match placement {
            Placement::Front => ordered.push(layer),
            Placement::Back => ordered.insert(0, layer),
        }
        self.canvas = self.canvas.reindexed(ordered);
    }
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    Front,
    Back,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_in_paint_order(editor: &CanvasEditor) -> Vec<LayerId> {
        editor
            .canvas()
            .paint_order()
            .into_iter()
            .map(|l| l.id.clone())
            .collect()
    }

    fn editor_with_three() -> (CanvasEditor, [LayerId; 3]) {
        let mut editor = CanvasEditor::new();
        let a = editor.add_text_layer();
        let b = editor.add_text_layer();
        let c = editor.add_text_layer();
        (editor, [a, b, c])
    }

    #[test]
    fn test_new_editor_is_blank_default_canvas() {
        let editor = CanvasEditor::new();
        assert_eq!(editor.canvas().width, 1080);
        assert!(editor.canvas().is_empty());
        assert!(editor.selected_layer_id().is_none());
    }

    #[test]
    fn test_from_canvas_fills_defaults() {
        let mut source = CanvasState::new(1200, 628);
        let mut layer = CanvasLayer::text("hi").with_z_index(crate::layer::UNRANKED);
        layer.font_size = None;
        source.layers.push(layer);

        let editor = CanvasEditor::from_canvas(&source);
        let loaded = &editor.canvas().layers[0];
        assert_eq!(loaded.z_index, 0);
        assert_eq!(loaded.font_size, Some(48.0));
        assert_eq!(editor.canvas().width, 1200);
    }

    #[test]
    fn test_initialize_resets_selection() {
        let (mut editor, [a, ..]) = editor_with_three();
        editor.select_layer(Some(a));
        editor.initialize(None);
        assert!(editor.canvas().is_empty());
        assert!(editor.selected_layer_id().is_none());
    }

    #[test]
    fn test_add_text_layer_goes_on_top() {
        let (editor, [a, b, c]) = editor_with_three();
        assert_eq!(ids_in_paint_order(&editor), vec![a, b, c.clone()]);
        let top = editor.layer(&c).expect("layer");
        assert_eq!(top.z_index, 2);
        assert_eq!(top.kind, LayerKind::Text);
        assert_eq!(top.content.as_deref(), Some(NEW_TEXT_CONTENT));
    }

    #[test]
    fn test_select_nonexistent_is_allowed() {
        let mut editor = CanvasEditor::new();
        editor.select_layer(Some(LayerId::from("ghost")));
        assert_eq!(editor.selected_layer_id(), Some(&LayerId::from("ghost")));
        assert!(editor.selected_layer().is_none());
    }

    #[test]
    fn test_update_layer_merges_and_selects() {
        let (mut editor, [a, b, _]) = editor_with_three();
        editor.update_layer(&b, &LayerPatch::position(7.0, 8.0));

        let layer = editor.layer(&b).expect("layer");
        assert!((layer.x - 7.0).abs() < f32::EPSILON);
        assert!((layer.width - 400.0).abs() < f32::EPSILON);
        assert_eq!(editor.selected_layer_id(), Some(&b));

        let untouched = editor.layer(&a).expect("layer");
        assert!((untouched.x - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_patch_only_changes_selection() {
        let (mut editor, [a, ..]) = editor_with_three();
        let before = editor.canvas().clone();
        editor.update_layer(&a, &LayerPatch::default());
        assert_eq!(editor.canvas(), &before);
        assert_eq!(editor.selected_layer_id(), Some(&a));
    }

    #[test]
    fn test_update_missing_layer_is_noop() {
        let (mut editor, _) = editor_with_three();
        let before = editor.canvas().clone();
        let ghost = LayerId::from("ghost");
        editor.update_layer(&ghost, &LayerPatch::position(1.0, 1.0));
        assert_eq!(editor.canvas(), &before);
        assert_eq!(editor.selected_layer_id(), Some(&ghost));
    }

    #[test]
    fn test_remove_reindexes_and_clears_selection() {
        let (mut editor, [a, b, c]) = editor_with_three();
        editor.select_layer(Some(c.clone()));
        editor.remove_layer(&a);

        assert_eq!(ids_in_paint_order(&editor), vec![b.clone(), c.clone()]);
        assert_eq!(editor.layer(&b).expect("b").z_index, 0);
        assert_eq!(editor.layer(&c).expect("c").z_index, 1);
        assert!(editor.selected_layer_id().is_none());
    }

    #[test]
    fn test_remove_missing_still_clears_selection() {
        let (mut editor, [a, ..]) = editor_with_three();
        editor.select_layer(Some(a));
        editor.remove_layer(&LayerId::from("ghost"));
        assert_eq!(editor.canvas().layer_count(), 3);
        assert!(editor.selected_layer_id().is_none());
    }

    #[test]
    fn test_bring_to_front() {
        let (mut editor, [a, b, c]) = editor_with_three();
        editor.bring_to_front(&a);

        assert_eq!(editor.layer(&a).expect("a").z_index, 2);
        assert_eq!(editor.layer(&b).expect("b").z_index, 0);
        assert_eq!(editor.layer(&c).expect("c").z_index, 1);
        assert!(editor.canvas().has_dense_z_order());
    }

    #[test]
    fn test_send_to_back() {
        let (mut editor, [a, b, c]) = editor_with_three();
        editor.send_to_back(&c);
        assert_eq!(ids_in_paint_order(&editor), vec![c, a, b]);
    }

    #[test]
    fn test_reorder_missing_is_noop() {
        let (mut editor, _) = editor_with_three();
        let before = editor.canvas().clone();
        editor.bring_to_front(&LayerId::from("ghost"));
        editor.send_to_back(&LayerId::from("ghost"));
        assert_eq!(editor.canvas(), &before);
    }

    #[test]
    fn test_reorder_uses_z_index_when_collection_diverges() {
        let mut source = CanvasState::new(100, 100);
        let back = CanvasLayer::text("back").with_z_index(0);
        let middle = CanvasLayer::text("middle").with_z_index(1);
        let front = CanvasLayer::text("front").with_z_index(2);
        source.layers = vec![front.clone(), back.clone(), middle.clone()];

        let mut editor = CanvasEditor::from_canvas(&source);
        editor.send_to_back(&middle.id);

        assert_eq!(
            ids_in_paint_order(&editor),
            vec![middle.id, back.id, front.id]
        );
    }

    #[test]
    fn test_insert_image_layer() {
        let mut editor = CanvasEditor::new();
        editor.add_text_layer();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let image = EmbeddedImage::from_bytes(&png).expect("png header");
        let id = editor.insert_image_layer(image);

        let layer = editor.layer(&id).expect("image layer");
        assert_eq!(layer.kind, LayerKind::Image);
        assert_eq!(layer.z_index, 1);
        assert!((layer.width - 400.0).abs() < f32::EPSILON);
        assert!(layer
            .src
            .as_deref()
            .is_some_and(|s| s.starts_with("data:image/png;base64,")));
    }

    #[tokio::test]
    async fn test_add_image_layer_failure_adds_nothing() {
        let mut editor = CanvasEditor::new();
        let result = editor.add_image_layer("/no/such/file.png").await;
        assert!(result.is_none());
        assert!(editor.canvas().is_empty());
    }

    #[tokio::test]
    async fn test_add_image_layer_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logo.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").expect("write");

        let mut editor = CanvasEditor::new();
        let id = editor.add_image_layer(&path).await.expect("added");
        assert_eq!(editor.canvas().layer_count(), 1);
        assert!(editor
            .layer(&id)
            .and_then(|l| l.src.as_deref())
            .is_some_and(|s| s.starts_with("data:image/gif;base64,")));
    }

    #[tokio::test]
    async fn test_replace_image_updates_src() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("swap.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").expect("write");

        let mut editor = CanvasEditor::new();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let id = editor.insert_image_layer(EmbeddedImage::from_bytes(&png).expect("png header"));

        assert!(editor.replace_image(&id, &path).await);
        let layer = editor.layer(&id).expect("layer");
        assert!(layer
            .src
            .as_deref()
            .is_some_and(|s| s.starts_with("data:image/gif;base64,")));
        assert_eq!(layer.z_index, 0);
        assert_eq!(editor.selected_layer_id(), Some(&id));
    }

    #[tokio::test]
    async fn test_replace_image_failure_keeps_src() {
        let mut editor = CanvasEditor::new();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let id = editor.insert_image_layer(EmbeddedImage::from_bytes(&png).expect("png header"));
        let before = editor.canvas().clone();

        assert!(!editor.replace_image(&id, "/no/such/file.png").await);
        assert_eq!(editor.canvas(), &before);

        let text = editor.add_text_layer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ok.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").expect("write");
        assert!(!editor.replace_image(&text, &path).await);
        assert!(editor.layer(&text).is_some_and(|l| l.src.is_none()));
    }
}
