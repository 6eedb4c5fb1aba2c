//! # TemplateCraft Core
//!
//! Editing engine for marketing templates: positioned text and image layers
//! on a fixed-size canvas, with debounced persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 craft-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Editor           │  Interaction            │
//! │  - Layers         │  - Drag / resize        │
//! │  - Selection      │  - Frame coalescing     │
//! │  - Z-order        │                         │
//! ├─────────────────────────────────────────────┤
//! │  Autosave         │  Store                  │
//! │  - Debounce       │  - Templates / designs  │
//! │  - Status         │  - Memory / JSON file   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use craft_core::{CanvasEditor, Channel, EntityMeta, Library, LayerPatch};
//!
//! let library = Library::in_memory();
//! let template = library
//!     .create_template(&EntityMeta::new("Spring sale", Channel::Instagram))
//!     .unwrap();
//!
//! let mut editor = CanvasEditor::from_canvas(&template.canvas);
//! let id = editor.add_text_layer();
//! editor.update_layer(&id, &LayerPatch::content("20% off"));
//!
//! library.save_template(&template.with_canvas(editor.canvas())).unwrap();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod autosave;
pub mod canvas;
pub mod copy;
pub mod editor;
pub mod entity;
pub mod error;
pub mod id;
pub mod image;
pub mod interaction;
pub mod layer;
pub mod store;

pub use autosave::{AutosaveConfig, AutosaveCoordinator, AutosaveStatus};
pub use canvas::CanvasState;
pub use copy::{insert_suggestion, CannedSuggester, CopySuggester};
pub use editor::CanvasEditor;
pub use entity::{Channel, Design, EntityKind, EntityMeta, EntityStatus, Template};
pub use error::{CanvasError, CanvasResult};
pub use image::EmbeddedImage;
pub use interaction::{FrameQueue, FrameScheduler, FrameToken, LayerInteraction};
pub use layer::{CanvasLayer, LayerId, LayerKind, LayerPatch};
pub use store::{EntityStore, JsonFileStore, Library, MemoryStore, StoreError};

/// TemplateCraft core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
