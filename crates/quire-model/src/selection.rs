//! Selections and ranges.
//!
//! ## Learning: Range Types
//!
//! Like `std::ops::Range`, every range here is half-open: `from` is
//! included, `to` is not. A caret is simply a selection whose ends meet.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::{ModelError, ModelResult};

/// A selection in a document.
///
/// The anchor is where the selection started and the head is where it
/// currently ends; the head may come before the anchor. Selections are
/// only meaningful for the document version they were made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    /// Creates a selection from an anchor and a head.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Creates a collapsed selection.
    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Creates a forward selection from `from` to `to`.
    pub fn range(from: usize, to: usize) -> Self {
        Self::new(from, to)
    }

    /// Selects the whole document.
    pub fn all(doc: &Document) -> Self {
        Self::range(0, doc.size())
    }

    /// Returns the smaller end.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Returns the larger end.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Returns true for a caret.
    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    /// Returns the number of positions covered.
    pub fn len(&self) -> usize {
        self.to() - self.from()
    }

    /// Returns true if the selection covers no positions.
    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }

    /// Returns true if `pos` lies within the selection (end exclusive).
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.from() && pos < self.to()
    }

    /// Fails unless both ends are valid in `doc`.
    pub fn validate(&self, doc: &Document) -> ModelResult<()> {
        let size = doc.size();
        if self.to() > size {
            return Err(ModelError::PositionOutOfBounds {
                pos: self.to(),
                size,
            });
        }
        Ok(())
    }

    /// Returns the selection as a mark range.
    pub fn as_range(&self) -> MarkRange {
        MarkRange {
            from: self.from(),
            to: self.to(),
        }
    }
}

impl From<MarkRange> for Selection {
    fn from(range: MarkRange) -> Self {
        Selection::range(range.from, range.to)
    }
}

/// A span of positions, `from` inclusive and `to` exclusive.
///
/// Produced by the range resolver: the maximal span around a position
/// over which one mark is uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkRange {
    pub from: usize,
    pub to: usize,
}

impl MarkRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Returns true if `pos` lies strictly inside the range.
    pub fn strictly_contains(&self, pos: usize) -> bool {
        pos > self.from && pos < self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}
