//! # Quire Core
//!
//! Editing session logic on top of the document model.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     EditorSession                         │
//! │  ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌─────────────┐ │
//! │  │  Keymap  │ │  Config  │ │  History  │ │ DraftFields │ │
//! │  └──────────┘ └──────────┘ └───────────┘ └─────────────┘ │
//! │        │                                                  │
//! │  ┌─────┴──────────────┐      ┌──────────────────────────┐ │
//! │  │  Engine (commands) │      │     AssetCoordinator     │ │
//! │  └─────┬──────────────┘      └────────────┬─────────────┘ │
//! └────────┼──────────────────────────────────┼───────────────┘
//!          │                                  │
//!    quire-model                     dyn GalleryClient
//! ```
//!
//! ## Learning: Module Organization
//!
//! Rust modules map to files:
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `pub use` re-exports items for cleaner public APIs

pub mod assets;
pub mod command;
pub mod config;
pub mod draft;
pub mod event;
pub mod keymap;
pub mod session;
pub mod transaction;

pub use assets::{
    Asset, AssetCoordinator, AssetError, GalleryClient, LocalFile, UploadLimits, UploadState,
    asset_node, youtube_video_id,
};
pub use command::{BlockType, Command, ToolbarAction};
pub use config::{Config, ConfigError};
pub use draft::{DraftField, DraftFields, FieldName, PostDraft, SavedPost, Thumbnail, slugify};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use keymap::{Key, KeyBinding, KeyPress, Keymap, Modifiers};
pub use session::{EditorSession, LinkEdit};
pub use transaction::{Applied, Engine};

use quire_model::ModelError;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown draft field: {0}")]
    UnknownField(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl CoreError {
    /// Returns true for failures the user can retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Asset(e) if e.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::SchemaViolation;

    #[test]
    fn test_error_conversions() {
        let err: CoreError = ModelError::NoNodeAt { pos: 4 }.into();
        assert!(matches!(err, CoreError::Model(_)));
        assert!(!err.is_retryable());

        let err: CoreError = AssetError::List("timeout".into()).into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Asset error: Failed to list gallery assets: timeout");
    }

    #[test]
    fn test_schema_violation_reaches_core() {
        let violation = SchemaViolation::InvalidMark {
            mark: quire_model::MarkType::Link,
            reason: "empty href".into(),
        };
        let err = CoreError::from(ModelError::from(violation));
        assert!(err.to_string().starts_with("Model error: schema violation"));
    }
}
