//! Durable storage for templates and designs.
//!
//! Each partition is an [`EntityStore`]: a flat list of entities with upsert
//! by id. [`Library`] pairs the template and design partitions and provides
//! the create, save, and metadata operations the editor works against.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::entity::{EntityKind, EntityMeta, EntityStatus, Template};
use crate::id::{current_timestamp_ms, generate_id};
use crate::CanvasState;

/// Errors that can occur while writing a partition.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One storage partition of entities keyed by id.
///
/// Reads never fail: an unreadable partition is an empty one.
pub trait EntityStore: Send + Sync + Debug {
    /// All entities, in insertion order.
    fn list(&self) -> Vec<Template>;

    /// Look up one entity.
    fn get_by_id(&self, id: &str) -> Option<Template> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Insert or replace by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition cannot be written.
    fn put(&self, entity: Template) -> Result<(), StoreError>;
}

fn upsert(list: &mut Vec<Template>, entity: Template) {
    match list.iter_mut().find(|e| e.id == entity.id) {
        Some(slot) => *slot = entity,
        None => list.push(entity),
    }
}

/// In-memory partition.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<Vec<Template>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl EntityStore for MemoryStore {
    fn list(&self) -> Vec<Template> {
        self.entities
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn put(&self, entity: Template) -> Result<(), StoreError> {
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        upsert(&mut entities, entity);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A partition stored as one pretty-printed JSON array file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Open the partition for `kind` under `data_dir`, creating the
    /// directory if needed. The file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl AsRef<Path>, kind: EntityKind) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(format!("{}.json", kind.storage_key())),
            lock: RwLock::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Vec<Template> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed store file {}: {e}",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }
}

impl EntityStore for JsonFileStore {
    fn list(&self) -> Vec<Template> {
        let _guard = self
            .lock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.read_all()
    }

    fn put(&self, entity: Template) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut list = self.read_all();
        upsert(&mut list, entity);
        replace_file(&self.path, |file| {
            serde_json::to_writer_pretty(file, &list)?;
            Ok(())
        })
    }
}

/// Write a sibling temp file with `write` and rename it over `path`.
///
/// `path` keeps its previous contents if any step fails.
fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut std::fs::File) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Template and design partitions with the operations the editor needs.
#[derive(Debug, Clone)]
pub struct Library {
    templates: Arc<dyn EntityStore>,
    designs: Arc<dyn EntityStore>,
}

impl Library {
    /// Compose two partitions.
    #[must_use]
    pub fn new(templates: Arc<dyn EntityStore>, designs: Arc<dyn EntityStore>) -> Self {
        Self { templates, designs }
    }

    /// A library backed by two fresh [`MemoryStore`]s.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// A library backed by JSON files under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        Ok(Self::new(
            Arc::new(JsonFileStore::open(data_dir, EntityKind::Template)?),
            Arc::new(JsonFileStore::open(data_dir, EntityKind::Design)?),
        ))
    }

    /// The partition `kind` lives in.
    #[must_use]
    pub fn partition(&self, kind: EntityKind) -> &Arc<dyn EntityStore> {
        match kind {
            EntityKind::Template => &self.templates,
            EntityKind::Design => &self.designs,
        }
    }

    fn put(&self, entity: Template) -> Result<(), StoreError> {
        let id = entity.id.clone();
        self.partition(entity.kind()).put(entity).map_err(|e| {
            tracing::warn!("Failed to persist {id}: {e}");
            e
        })
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Create and persist an empty draft template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the template partition cannot be written.
    pub fn create_template(&self, meta: &EntityMeta) -> Result<Template, StoreError> {
        let template = Template::new(EntityKind::Template, meta);
        self.put(template.clone())?;
        tracing::debug!("Created template {}", template.id);
        Ok(template)
    }

    /// All templates.
    #[must_use]
    pub fn templates(&self) -> Vec<Template> {
        self.templates.list()
    }

    /// Look up a template.
    #[must_use]
    pub fn template_by_id(&self, id: &str) -> Option<Template> {
        self.templates.get_by_id(id)
    }

    /// Upsert a template with a fresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the template partition cannot be written.
    pub fn save_template(&self, template: &Template) -> Result<(), StoreError> {
        self.templates.put(template.stamped()).map_err(|e| {
            tracing::warn!("Failed to save template {}: {e}", template.id);
            e
        })
    }

    /// Rename or re-channel a template. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the template partition cannot be written.
    pub fn update_template_meta(&self, id: &str, meta: &EntityMeta) -> Result<bool, StoreError> {
        self.update_meta(EntityKind::Template, id, meta)
    }

    // -----------------------------------------------------------------------
    // Designs
    // -----------------------------------------------------------------------

    /// All designs.
    #[must_use]
    pub fn designs(&self) -> Vec<Template> {
        self.designs.list()
    }

    /// Look up a design.
    #[must_use]
    pub fn design_by_id(&self, id: &str) -> Option<Template> {
        self.designs.get_by_id(id)
    }

    /// Persist a copy of `template` as a new draft design.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the design partition cannot be written.
    pub fn create_design_from_template(&self, template: &Template) -> Result<Template, StoreError> {
        let design = Template {
            id: generate_id(EntityKind::Design.id_prefix()),
            status: EntityStatus::Draft,
            updated_at: current_timestamp_ms(),
            ..template.clone()
        };
        self.put(design.clone())?;
        tracing::debug!("Created design {} from {}", design.id, template.id);
        Ok(design)
    }

    /// Upsert a design with a fresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the design partition cannot be written.
    pub fn save_design(&self, design: &Template) -> Result<(), StoreError> {
        self.designs.put(design.stamped()).map_err(|e| {
            tracing::warn!("Failed to save design {}: {e}", design.id);
            e
        })
    }

    /// Rename or re-channel a design. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the design partition cannot be written.
    pub fn update_design_meta(&self, id: &str, meta: &EntityMeta) -> Result<bool, StoreError> {
        self.update_meta(EntityKind::Design, id, meta)
    }

    // -----------------------------------------------------------------------
    // Shared
    // -----------------------------------------------------------------------

    /// Save to whichever partition the id belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition cannot be written.
    pub fn save(&self, entity: &Template) -> Result<(), StoreError> {
        match entity.kind() {
            EntityKind::Template => self.save_template(entity),
            EntityKind::Design => self.save_design(entity),
        }
    }

    /// Derive a design from `template` carrying the edited `canvas`.
    ///
    /// `thumbnail` falls back to the template's own when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the design partition cannot be written.
    pub fn use_as_design(
        &self,
        template: &Template,
        canvas: &CanvasState,
        thumbnail: Option<String>,
    ) -> Result<Template, StoreError> {
        let source = Template {
            canvas: canvas.clone(),
            thumbnail: thumbnail.or_else(|| template.thumbnail.clone()),
            ..template.clone()
        };
        self.create_design_from_template(&source)
    }

    fn update_meta(&self, kind: EntityKind, id: &str, meta: &EntityMeta) -> Result<bool, StoreError> {
        let Some(existing) = self.partition(kind).get_by_id(id) else {
            tracing::debug!("No {kind:?} {id} to update");
            return Ok(false);
        };
        let updated = Template {
            name: meta.normalized_name(kind),
            channel: meta.channel,
            updated_at: current_timestamp_ms(),
            ..existing
        };
        self.partition(kind).put(updated)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Channel;
    use crate::CanvasLayer;

    fn meta(name: &str) -> EntityMeta {
        EntityMeta::new(name, Channel::Instagram)
    }

    #[test]
    fn test_create_then_get_roundtrip() {
        let library = Library::in_memory();
        let created = library.create_template(&meta("Promo")).expect("create");

        let fetched = library.template_by_id(&created.id).expect("exists");
        assert_eq!(fetched.canvas.layer_count(), 0);
        assert_eq!(fetched.status, EntityStatus::Draft);
        assert_eq!(fetched.name, "Promo");
        assert_eq!(library.templates().len(), 1);
        assert!(library.designs().is_empty());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let library = Library::in_memory();
        assert!(library.template_by_id("tpl-nope").is_none());
        assert!(library.design_by_id("design-nope").is_none());
    }

    #[test]
    fn test_put_upserts_by_id() {
        let store = MemoryStore::new();
        let mut tpl = Template::new(EntityKind::Template, &meta("A"));
        store.put(tpl.clone()).expect("put");
        tpl.name = "B".to_string();
        store.put(tpl.clone()).expect("put");

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get_by_id(&tpl.id).expect("exists").name, "B");
        assert_eq!(store.put_count(), 2);
    }

    #[test]
    fn test_update_meta_normalizes_name() {
        let library = Library::in_memory();
        let tpl = library.create_template(&meta("Old")).expect("create");

        let updated = library
            .update_template_meta(&tpl.id, &EntityMeta::new("  ", Channel::Twitter))
            .expect("update");
        assert!(updated);

        let fetched = library.template_by_id(&tpl.id).expect("exists");
        assert_eq!(fetched.name, "Untitled Template");
        assert_eq!(fetched.channel, Channel::Twitter);
    }

    #[test]
    fn test_update_meta_missing_is_noop() {
        let library = Library::in_memory();
        assert!(!library
            .update_design_meta("design-missing", &meta("x"))
            .expect("update"));
        assert!(library.designs().is_empty());
    }

    #[test]
    fn test_use_as_design_copies_canvas() {
        let library = Library::in_memory();
        let tpl = library.create_template(&meta("Base")).expect("create");
        let mut canvas = tpl.canvas.clone();
        canvas.layers.push(CanvasLayer::text("Hello"));

        let design = library
            .use_as_design(&tpl, &canvas, Some("data:image/png;base64,AA==".into()))
            .expect("design");

        assert!(design.id.starts_with("design-"));
        assert_eq!(design.status, EntityStatus::Draft);
        assert_eq!(design.canvas, canvas);
        assert_eq!(design.name, "Base");
        assert_eq!(library.design_by_id(&design.id), Some(design.clone()));
        // The source template is untouched.
        assert!(library
            .template_by_id(&tpl.id)
            .expect("exists")
            .canvas
            .is_empty());
    }

    #[test]
    fn test_use_as_design_thumbnail_falls_back() {
        let library = Library::in_memory();
        let mut tpl = library.create_template(&meta("Base")).expect("create");
        tpl.thumbnail = Some("data:image/png;base64,BB==".into());

        let design = library
            .use_as_design(&tpl, &tpl.canvas, None)
            .expect("design");
        assert_eq!(design.thumbnail, tpl.thumbnail);
    }

    #[test]
    fn test_save_routes_by_prefix() {
        let library = Library::in_memory();
        let design = Template::new(EntityKind::Design, &meta("D"));
        library.save(&design).expect("save");

        assert!(library.templates().is_empty());
        assert_eq!(library.designs().len(), 1);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = {
            let library = Library::open(dir.path()).expect("open");
            library.create_template(&meta("Saved")).expect("create")
        };

        let reopened = Library::open(dir.path()).expect("reopen");
        let fetched = reopened.template_by_id(&created.id).expect("exists");
        assert_eq!(fetched, created);
        assert!(dir.path().join("templatecraft.templates.json").exists());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path(), EntityKind::Design).expect("open");
        assert!(store.list().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path(), EntityKind::Template).expect("open");
        std::fs::write(store.path(), "{not json").expect("write");
        assert!(store.list().is_empty());

        // A write replaces the corrupt contents.
        let tpl = Template::new(EntityKind::Template, &meta("Fresh"));
        store.put(tpl.clone()).expect("put");
        assert_eq!(store.list(), vec![tpl]);
    }

    #[test]
    fn test_file_store_non_array_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path(), EntityKind::Template).expect("open");
        std::fs::write(store.path(), r#"{"id":"tpl-1"}"#).expect("write");
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_previous_partition() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(dir.path(), EntityKind::Template).expect("open");
        let kept = Template::new(EntityKind::Template, &meta("Kept"));
        store.put(kept.clone()).expect("put");

        let result = replace_file(store.path(), |file| {
            file.write_all(b"[{\"id\": \"tpl-tr")?;
            Err(std::io::Error::other("disk full").into())
        });
        assert!(result.is_err());

        assert_eq!(store.list(), vec![kept]);
        let entries = std::fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1, "temp file left behind");
    }
}
