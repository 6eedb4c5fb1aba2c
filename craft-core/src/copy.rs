//! Marketing copy suggestions.
//!
//! Generation is pluggable through [`CopySuggester`]; the bundled
//! [`CannedSuggester`] needs no network and is deterministic.

use crate::editor::CanvasEditor;
use crate::layer::LayerPatch;

/// Topic used when the prompt is blank.
pub const DEFAULT_TOPIC: &str = "your offer";

/// Produces candidate copy lines for a prompt.
pub trait CopySuggester {
    /// Suggestions for `prompt`, best first.
    fn suggest(&self, prompt: &str) -> Vec<String>;
}

/// Fixed phrasings around the prompt's topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedSuggester;

impl CopySuggester for CannedSuggester {
    fn suggest(&self, prompt: &str) -> Vec<String> {
        let topic = match prompt.trim() {
            "" => DEFAULT_TOPIC,
            topic => topic,
        };
        ["save big today", "limited time only", "shop now and enjoy perks"]
            .iter()
            .map(|tail| format!("{topic}: {tail}"))
            .collect()
    }
}

/// Write `text` into the selected layer's content.
///
/// Returns `false` and changes nothing when no layer is selected.
pub fn insert_suggestion(editor: &mut CanvasEditor, text: &str) -> bool {
    let Some(id) = editor.selected_layer_id().cloned() else {
        return false;
    };
    editor.update_layer(&id, &LayerPatch::content(text));
    true
}
