//! # TemplateCraft CLI
//!
//! Command-line host for the editing engine. Each invocation opens the
//! library under `--data-dir`, applies one command, and exits; edits flow
//! through the same editor, interaction and autosave paths an interactive
//! host would use.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use craft_core::{
    insert_suggestion, CannedSuggester, Channel, CopySuggester, EntityKind, EntityMeta, FrameQueue,
    LayerId, LayerInteraction, LayerPatch, Library, Template,
};
use craft_renderer::ThumbnailRenderer;

pub use session::EditSession;

/// Command-line arguments for templatecraft.
#[derive(Debug, Clone, Parser)]
#[command(name = "templatecraft")]
#[command(about = "Edit marketing templates and designs")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the template and design stores
    #[arg(long, env = "TEMPLATECRAFT_DATA_DIR", default_value = "./templatecraft-data")]
    pub data_dir: PathBuf,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty template
    Create {
        /// Template name
        name: String,
        /// Target channel
        #[arg(long, default_value = "generic")]
        channel: Channel,
    },
    /// List templates, or designs with --designs
    List {
        /// List designs instead of templates
        #[arg(long)]
        designs: bool,
    },
    /// Print an entity as JSON
    Show {
        /// Template or design id
        id: String,
    },
    /// Rename or re-channel an entity
    Meta {
        /// Template or design id
        id: String,
        /// New name (blank becomes "Untitled ...")
        #[arg(long)]
        name: String,
        /// New channel (unchanged when omitted)
        #[arg(long)]
        channel: Option<Channel>,
    },
    /// Add a text layer on top
    AddText {
        /// Template or design id
        id: String,
        /// Initial text
        #[arg(long)]
        content: Option<String>,
    },
    /// Add an image layer from a file
    AddImage {
        /// Template or design id
        id: String,
        /// Image file path
        path: PathBuf,
    },
    /// Change layer properties
    Set {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
        /// Text content
        #[arg(long)]
        content: Option<String>,
        /// Font size
        #[arg(long)]
        font_size: Option<f32>,
        /// Text color
        #[arg(long)]
        color: Option<String>,
        /// Opacity in 0..=1
        #[arg(long)]
        opacity: Option<f32>,
        /// Rotation in degrees
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f32>,
        /// Replace the image of an image layer with this file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Move a layer
    Move {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
        /// New x
        #[arg(long, allow_hyphen_values = true)]
        x: f32,
        /// New y
        #[arg(long, allow_hyphen_values = true)]
        y: f32,
    },
    /// Resize a layer (minimum 40 on each side)
    Resize {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
        /// New width
        #[arg(long)]
        width: f32,
        /// New height
        #[arg(long)]
        height: f32,
    },
    /// Delete a layer
    RemoveLayer {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
    },
    /// Bring a layer to the front
    Front {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
    },
    /// Send a layer to the back
    Back {
        /// Template or design id
        id: String,
        /// Layer id
        layer: String,
    },
    /// Render a PNG thumbnail
    Thumbnail {
        /// Template or design id
        id: String,
        /// Output file
        #[arg(long)]
        out: PathBuf,
        /// Longest side in pixels
        #[arg(long, default_value_t = 400)]
        max: u32,
    },
    /// Derive a design from a template
    Use {
        /// Template id
        id: String,
    },
    /// Suggest copy, optionally writing the first line into a layer
    Suggest {
        /// What the copy is about
        #[arg(long, default_value = "")]
        prompt: String,
        /// Entity and layer to write into, as `<id> <layer>`
        #[arg(long, num_args = 2, value_names = ["ID", "LAYER"])]
        insert: Option<Vec<String>>,
    },
}

/// Run one command against the library in `args.data_dir`.
///
/// # Errors
///
/// Returns an error if the library cannot be opened, a referenced entity
/// does not exist, or output cannot be written.
#[allow(clippy::too_many_lines)]
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let library = Arc::new(
        Library::open(&args.data_dir)
            .with_context(|| format!("opening {}", args.data_dir.display()))?,
    );
    tracing::debug!("Using data directory {}", args.data_dir.display());

    match args.command {
        Command::Create { name, channel } => {
            let template = library.create_template(&EntityMeta::new(name, channel))?;
            println!("{}", template.id);
        }
        Command::List { designs } => {
            let entities = if designs {
                library.designs()
            } else {
                library.templates()
            };
            for entity in entities {
                println!("{}", summary(&entity));
            }
        }
        Command::Show { id } => {
            let session = EditSession::open(Arc::clone(&library), &id)?;
            println!("{}", serde_json::to_string_pretty(session.entity())?);
        }
        Command::Meta { id, name, channel } => {
            let kind = EntityKind::of(&id);
            let stored = match kind {
                EntityKind::Template => library.template_by_id(&id),
                EntityKind::Design => library.design_by_id(&id),
            }
            .with_context(|| format!("no template or design with id {id}"))?;
            let meta = EntityMeta::new(name, channel.unwrap_or(stored.channel));
            let updated = match kind {
                EntityKind::Template => library.update_template_meta(&id, &meta)?,
                EntityKind::Design => library.update_design_meta(&id, &meta)?,
            };
            anyhow::ensure!(updated, "no template or design with id {id}");
        }
        Command::AddText { id, content } => {
            edit(&library, &id, |session| {
                let layer = session.editor_mut().add_text_layer();
                if let Some(content) = content {
                    session
                        .editor_mut()
                        .update_layer(&layer, &LayerPatch::content(content));
                }
                println!("{layer}");
            })?;
        }
        Command::AddImage { id, path } => {
            let mut session = EditSession::open(Arc::clone(&library), &id)?;
            let layer = session
                .editor_mut()
                .add_image_layer(&path)
                .await
                .with_context(|| format!("cannot use {} as an image", path.display()))?;
            session.commit();
            drop(session.close());
            println!("{layer}");
        }
        Command::Set {
            id,
            layer,
            content,
            font_size,
            color,
            opacity,
            rotation,
            image,
        } => {
            let layer = LayerId::from(layer);
            let patch = LayerPatch {
                content,
                font_size,
                color,
                opacity,
                rotation,
                ..LayerPatch::default()
            };
            let mut session = EditSession::open(Arc::clone(&library), &id)?;
            if let Some(path) = image {
                anyhow::ensure!(
                    session.editor_mut().replace_image(&layer, &path).await,
                    "cannot use {} as an image for {layer}",
                    path.display()
                );
            }
            if !patch.is_empty() {
                session.editor_mut().update_layer(&layer, &patch);
            }
            session.commit();
            drop(session.close());
        }
        Command::Move { id, layer, x, y } => {
            edit(&library, &id, |session| {
                interact(session, LayerId::from(layer), |interaction, frames| {
                    interaction.drag(x, y, frames);
                });
            })?;
        }
        Command::Resize {
            id,
            layer,
            width,
            height,
        } => {
            edit(&library, &id, |session| {
                let layer = LayerId::from(layer);
                let Some((x, y)) = session.editor().layer(&layer).map(|l| (l.x, l.y)) else {
                    return;
                };
                interact(session, layer, |interaction, frames| {
                    interaction.resize(width, height, x, y, frames);
                });
            })?;
        }
        Command::RemoveLayer { id, layer } => {
            edit(&library, &id, |session| {
                session.editor_mut().remove_layer(&LayerId::from(layer));
            })?;
        }
        Command::Front { id, layer } => {
            edit(&library, &id, |session| {
                session.editor_mut().bring_to_front(&LayerId::from(layer));
            })?;
        }
        Command::Back { id, layer } => {
            edit(&library, &id, |session| {
                session.editor_mut().send_to_back(&LayerId::from(layer));
            })?;
        }
        Command::Thumbnail { id, out, max } => {
            let session = EditSession::open(Arc::clone(&library), &id)?;
            let thumbnail = ThumbnailRenderer::new()
                .render(session.editor().canvas(), max)
                .await
                .context("thumbnail rendering is unavailable")?;
            tokio::fs::write(&out, &thumbnail.png)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{}x{} {}", thumbnail.width, thumbnail.height, out.display());
        }
        Command::Use { id } => {
            let template = library
                .template_by_id(&id)
                .with_context(|| format!("no template with id {id}"))?;
            let thumbnail = ThumbnailRenderer::new()
                .render_default(&template.canvas)
                .await
                .map(|t| t.to_data_uri());
            let design = library.use_as_design(&template, &template.canvas, thumbnail)?;
            println!("{}", design.id);
        }
        Command::Suggest { prompt, insert } => {
            let suggestions = CannedSuggester.suggest(&prompt);
            for line in &suggestions {
                println!("{line}");
            }
            if let Some([id, layer]) = insert.as_deref() {
                let first = suggestions.first().cloned().unwrap_or_default();
                edit(&library, id, |session| {
                    session
                        .editor_mut()
                        .select_layer(Some(LayerId::from(layer.as_str())));
                    insert_suggestion(session.editor_mut(), &first);
                })?;
            }
        }
    }
    Ok(())
}

/// Open a session, apply `f`, commit, and flush.
fn edit(
    library: &Arc<Library>,
    id: &str,
    f: impl FnOnce(&mut EditSession),
) -> anyhow::Result<Template> {
    let mut session = EditSession::open(Arc::clone(library), id)?;
    f(&mut session);
    session.commit();
    Ok(session.close())
}

/// Drive one pointer interaction through a frame to completion.
fn interact(
    session: &mut EditSession,
    layer: LayerId,
    gesture: impl FnOnce(&mut LayerInteraction, &mut FrameQueue),
) {
    let mut frames = FrameQueue::new();
    let mut interaction = LayerInteraction::new(layer);
    interaction.select(session.editor_mut());
    gesture(&mut interaction, &mut frames);
    for token in frames.advance() {
        interaction.on_frame(token, session.editor_mut());
    }
    interaction.teardown(&mut frames);
}

fn summary(entity: &Template) -> String {
    format!(
        "{}\t{}\t{}\t{:?}\t{} layers",
        entity.id,
        entity.name,
        entity.channel,
        entity.status,
        entity.canvas.layer_count()
    )
}
