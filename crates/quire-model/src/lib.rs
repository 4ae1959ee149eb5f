//! # Quire Model
//!
//! The document model behind the post editor: a schema-constrained tree
//! of blocks and marked text, addressed by integer positions.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Immutable Values
//! - A [`Document`] is never mutated in place
//! - Every edit in [`transform`] reads one document and builds a new root
//! - A failed edit simply drops the half-built tree; the old value is untouched
//!
//! ### Enums Instead of Class Hierarchies
//! - [`NodeKind`] carries each node type's attributes
//! - [`Content`] says whether a node holds blocks, text, or nothing
//! - Exhaustive `match` makes the compiler check every node type is handled

mod document;
mod history;
mod inline;
pub mod markup;
mod node;
mod resolve;
mod schema;
mod selection;
pub mod transform;

pub use document::{Document, ResolvedPos, TextblockRef};
pub use history::{ChangeKind, History, Snapshot};
pub use markup::SerializationError;
pub use node::{Content, Mark, MarkSet, Node, NodeKind, TextRun};
pub use resolve::{active_marks, mark_around, resolve_mark_range};
pub use schema::{ContentRule, MarkType, NodeType, Schema, SchemaViolation};
pub use selection::{MarkRange, Selection};

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while reading or editing a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("position {pos} is out of bounds (document size {size})")]
    PositionOutOfBounds { pos: usize, size: usize },

    #[error("no node starts at position {pos}")]
    NoNodeAt { pos: usize },

    #[error("invalid markup: {0}")]
    Serialization(#[from] SerializationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = Document::empty();
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 2);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_successor_bumps_version() {
        let doc = Document::empty();
        let next = doc.successor(doc.root().clone());
        assert_eq!(next.version(), 1);
        assert_eq!(next, doc);
    }

    #[test]
    fn test_serialization_error_converts() {
        let err: ModelError = markup::parse("<div>", &Schema::default())
            .unwrap_err()
            .into();
        assert!(matches!(err, ModelError::Serialization(_)));
    }
}
