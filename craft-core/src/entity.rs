//! Templates and designs: named canvases with channel and status metadata.

use serde::{Deserialize, Serialize};

use crate::id::{current_timestamp_ms, generate_id};
use crate::CanvasState;

/// Social channel a template is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Facebook feed.
    Facebook,
    /// Instagram feed.
    Instagram,
    /// LinkedIn feed.
    Linkedin,
    /// Twitter/X feed.
    Twitter,
    /// Not tied to a channel.
    #[default]
    Generic,
}

impl Channel {
    /// All channels, in display order.
    pub const ALL: [Self; 5] = [
        Self::Facebook,
        Self::Instagram,
        Self::Linkedin,
        Self::Twitter,
        Self::Generic,
    ];

    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel: {s}"))
    }
}

/// Publication status, derived from the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    /// Empty canvas.
    #[default]
    Draft,
    /// At least one layer.
    Active,
}

impl EntityStatus {
    /// `Active` iff the canvas has at least one layer.
    #[must_use]
    pub fn for_canvas(canvas: &CanvasState) -> Self {
        if canvas.is_empty() {
            Self::Draft
        } else {
            Self::Active
        }
    }
}

/// Which id namespace and storage partition an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A reusable template (`tpl-…`).
    Template,
    /// A design derived from a template (`design-…`).
    Design,
}

impl EntityKind {
    /// Classify an id by its prefix. Anything not in the design namespace
    /// is treated as a template.
    #[must_use]
    pub fn of(id: &str) -> Self {
        if id.starts_with("design") {
            Self::Design
        } else {
            Self::Template
        }
    }

    /// Prefix for generated ids.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Template => "tpl",
            Self::Design => "design",
        }
    }

    /// Key of the storage partition.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Template => "templatecraft.templates",
            Self::Design => "templatecraft-designs",
        }
    }

    /// Name given to entities saved with a blank name.
    #[must_use]
    pub const fn untitled_name(self) -> &'static str {
        match self {
            Self::Template => "Untitled Template",
            Self::Design => "Untitled Design",
        }
    }
}

/// User-editable metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Display name.
    pub name: String,
    /// Target channel.
    pub channel: Channel,
}

impl EntityMeta {
    /// Create metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, channel: Channel) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }

    /// Trimmed name, or the kind's untitled placeholder when blank.
    #[must_use]
    pub fn normalized_name(&self, kind: EntityKind) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            kind.untitled_name().to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// A template or design.
///
/// Designs share this shape; they differ only in id prefix and storage
/// partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Prefixed unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Target channel.
    pub channel: Channel,
    /// Derived publication status.
    pub status: EntityStatus,
    /// Last persisted write, milliseconds since the Unix epoch.
    pub updated_at: u64,
    /// The page and its layers.
    pub canvas: CanvasState,
    /// Rendered preview as a PNG data URI.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// A design is a template stored in the design partition.
pub type Design = Template;

impl Template {
    /// Create a fresh entity: new id, empty default canvas, draft status.
    #[must_use]
    pub fn new(kind: EntityKind, meta: &EntityMeta) -> Self {
        Self {
            id: generate_id(kind.id_prefix()),
            name: meta.normalized_name(kind),
            channel: meta.channel,
            status: EntityStatus::Draft,
            updated_at: current_timestamp_ms(),
            canvas: CanvasState::default(),
            thumbnail: None,
        }
    }

    /// Which namespace this entity's id belongs to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        EntityKind::of(&self.id)
    }

    /// A copy carrying `canvas`, the status derived from it, and a fresh
    /// timestamp.
    #[must_use]
    pub fn with_canvas(&self, canvas: &CanvasState) -> Self {
        Self {
            status: EntityStatus::for_canvas(canvas),
            canvas: canvas.clone(),
            updated_at: current_timestamp_ms(),
            ..self.clone()
        }
    }

    /// A copy with `updated_at` set to now.
    #[must_use]
    pub fn stamped(&self) -> Self {
        Self {
            updated_at: current_timestamp_ms(),
            ..self.clone()
        }
    }

    /// Comparable content snapshot of everything except `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            id: &'a str,
            name: &'a str,
            channel: Channel,
            status: EntityStatus,
            canvas: &'a CanvasState,
            thumbnail: Option<&'a str>,
        }

        serde_json::to_string(&Snapshot {
            id: &self.id,
            name: &self.name,
            channel: self.channel,
            status: self.status,
            canvas: &self.canvas,
            thumbnail: self.thumbnail.as_deref(),
        })
    }
}
