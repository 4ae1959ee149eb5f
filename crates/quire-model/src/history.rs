//! Undo/redo history.
//!
//! ## Learning: Snapshots over Inverse Edits
//!
//! Documents are immutable values, so the history does not need to know
//! how to reverse an edit. It keeps the document and selection from before
//! each step; undoing swaps the current state for the saved one and files
//! the current state on the redo stack.
//!
//! Consecutive typing is coalesced: keystrokes that continue at the caret
//! left by the previous keystroke, within the coalescing window, extend the
//! same undo step instead of opening a new one.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::document::Document;
use crate::selection::Selection;

/// Document and selection at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Selection,
}

impl Snapshot {
    pub fn new(document: Document, selection: Selection) -> Self {
        Self {
            document,
            selection,
        }
    }
}

/// What kind of change an undo step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Plain text typed at a caret; may coalesce with neighbouring typing.
    Typing,
    /// Anything else; always its own step.
    Other,
}

#[derive(Debug, Clone)]
struct Entry {
    before: Snapshot,
    kind: ChangeKind,
    /// Caret after the change, for typing continuity.
    caret_after: Option<usize>,
    timestamp: Option<Instant>,
}

/// Bounded undo/redo stacks.
///
/// ## Learning: VecDeque
///
/// The undo stack drops its oldest entry when full, so it needs cheap
/// removal at the front as well as push/pop at the back.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Entry>,
    redo_stack: Vec<Snapshot>,
    max_size: usize,
    coalesce_threshold: Duration,
}

impl History {
    /// Creates a history keeping at most `max_size` undo steps.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_size.min(1024)),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            coalesce_threshold: Duration::from_millis(500),
        }
    }

    /// Sets the window within which typing coalesces.
    pub fn with_coalesce_threshold(mut self, threshold: Duration) -> Self {
        self.coalesce_threshold = threshold;
        self
    }

    /// Records a change, given the state before it and the selection after it.
    ///
    /// Clears the redo stack.
    pub fn record(&mut self, before: Snapshot, kind: ChangeKind, after: Selection) {
        self.redo_stack.clear();
        let caret_after = after.is_caret().then_some(after.head);

        if kind == ChangeKind::Typing {
            if let Some(last) = self.undo_stack.back_mut() {
                let recent = last
                    .timestamp
                    .is_some_and(|t| t.elapsed() < self.coalesce_threshold);
                let continues = before.selection.is_caret()
                    && last.caret_after == Some(before.selection.head);
                if last.kind == ChangeKind::Typing && recent && continues {
                    last.caret_after = caret_after;
                    last.timestamp = Some(Instant::now());
                    return;
                }
            }
        }

        self.undo_stack.push_back(Entry {
            before,
            kind,
            caret_after,
            timestamp: Some(Instant::now()),
        });
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }

    /// Steps back, given the current state. Returns the state to restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(entry.before)
    }

    /// Steps forward again, given the current state. Returns the state to restore.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        // No timestamp: a redone step never coalesces with later typing.
        self.undo_stack.push_back(Entry {
            before: current,
            kind: ChangeKind::Other,
            caret_after: None,
            timestamp: None,
        });
        Some(next)
    }

    /// Ends the current typing step so the next keystroke opens a new one.
    pub fn seal(&mut self) {
        if let Some(last) = self.undo_stack.back_mut() {
            last.timestamp = None;
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Returns the number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
