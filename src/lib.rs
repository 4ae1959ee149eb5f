//! # Quire
//!
//! An embeddable editing engine for blog posts: rich text with links,
//! images and video embeds, a remote media gallery, and post metadata,
//! submitted together as one draft.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quire::{Command, Config, EditorSession, HttpGallery};
//!
//! quire::init_logging(1)?;
//! let config = Config::load();
//! let gallery = Arc::new(HttpGallery::from_config(&config.gallery)?);
//! let mut session = EditorSession::new(&config, gallery);
//!
//! session.apply(Command::InsertText("Hello".into()))?;
//! session.run_command("selectAll")?;
//! session.run_command("bold")?;
//! session.update_field_named("title", "First post")?;
//! let draft = session.finalize();
//! ```
//!
//! ## Crates
//!
//! - [`quire_model`]: schema, documents, positions, markup codec
//! - [`quire_core`]: transactions, session, assets, drafts, config
//! - [`quire_gallery`]: HTTP and in-memory gallery clients

pub mod logging;

pub use logging::init_logging;
pub use quire_core::{
    Asset, AssetCoordinator, AssetError, BlockType, Command, Config, CoreError, CoreResult,
    DraftField, EditorEvent, EditorSession, Engine, LinkEdit, LocalFile, PostDraft, SavedPost,
    Thumbnail, ToolbarAction,
};
pub use quire_gallery::{HttpGallery, MemoryGallery};
pub use quire_model::{Document, Mark, MarkType, Node, NodeKind, Schema, Selection};
