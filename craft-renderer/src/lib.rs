//! # TemplateCraft Renderer
//!
//! Rasterizes canvases into small PNG previews without a GPU or a browser.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        CanvasState (paint order)            │
//! ├──────────────────────┬──────────────────────┤
//! │ Text layer           │ Image layer          │
//! │ usvg tree -> resvg   │ image decode ->      │
//! │                      │ draw_pixmap          │
//! ├──────────────────────┴──────────────────────┤
//! │        tiny-skia Pixmap -> PNG              │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod image;
pub mod thumbnail;

pub use error::{RenderError, RenderResult};
pub use thumbnail::{render_thumbnail, Thumbnail, ThumbnailConfig, ThumbnailRenderer};

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
