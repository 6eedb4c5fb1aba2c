//! One editing session over a stored template or design.

use std::sync::Arc;

use anyhow::Context;
use craft_core::{
    AutosaveConfig, AutosaveCoordinator, CanvasEditor, EntityKind, Library, Template,
};

/// Loads an entity into an editor and autosaves every committed change.
///
/// Pending writes are flushed when the session closes, so nothing typed in
/// a short-lived command is lost to the debounce window.
#[derive(Debug)]
pub struct EditSession {
    library: Arc<Library>,
    entity: Template,
    editor: CanvasEditor,
    autosave: AutosaveCoordinator,
}

impl EditSession {
    /// Open the template or design with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no entity with that id exists.
    pub fn open(library: Arc<Library>, id: &str) -> anyhow::Result<Self> {
        let entity = match EntityKind::of(id) {
            EntityKind::Template => library.template_by_id(id),
            EntityKind::Design => library.design_by_id(id),
        }
        .with_context(|| format!("no template or design with id {id}"))?;

        let editor = CanvasEditor::from_canvas(&entity.canvas);
        let autosave = AutosaveCoordinator::new(
            Arc::clone(&library),
            AutosaveConfig::default().with_flush_on_teardown(true),
        );
        tracing::debug!("Opened {} ({} layers)", entity.id, entity.canvas.layer_count());

        Ok(Self {
            library,
            entity,
            editor,
            autosave,
        })
    }

    /// The entity as loaded.
    #[must_use]
    pub fn entity(&self) -> &Template {
        &self.entity
    }

    /// The editor.
    #[must_use]
    pub fn editor(&self) -> &CanvasEditor {
        &self.editor
    }

    /// Mutable access to the editor. Call [`EditSession::commit`] afterwards.
    pub fn editor_mut(&mut self) -> &mut CanvasEditor {
        &mut self.editor
    }

    /// Hand the current canvas to autosave.
    pub fn commit(&mut self) {
        self.autosave.observe(Some(&self.entity), self.editor.canvas());
    }

    /// Flush pending writes and return the entity as now stored.
    #[must_use]
    pub fn close(mut self) -> Template {
        self.commit();
        self.autosave.flush();
        self.autosave.teardown();

        let id = self.entity.id.clone();
        let stored = match self.entity.kind() {
            EntityKind::Template => self.library.template_by_id(&id),
            EntityKind::Design => self.library.design_by_id(&id),
        };
        stored.unwrap_or_else(|| self.entity.with_canvas(self.editor.canvas()))
    }
}
