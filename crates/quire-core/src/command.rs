//! Editing commands and toolbar actions.
//!
//! ## Learning: The Command Pattern
//!
//! Every edit is a value first and an effect second. A [`Command`] can be
//! built by a toolbar button, a key binding, or a test, queued into a
//! chain, and only then handed to the [`crate::Engine`], which is the
//! single place that turns commands into new documents.
//!
//! Toolbar buttons and key bindings speak in [`ToolbarAction`]s, the
//! string-named actions a UI can wire up without knowing about positions.

use std::fmt;

use quire_model::{MarkType, Node, NodeKind, Selection};

/// Target of a block type change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading(u8),
}

impl BlockType {
    pub fn node_kind(&self) -> NodeKind {
        match *self {
            BlockType::Paragraph => NodeKind::Paragraph,
            BlockType::Heading(level) => NodeKind::Heading { level },
        }
    }
}

/// A document command.
///
/// Commands that carry positions are only meaningful against the document
/// version the selection was taken from.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Text
    /// Replace the selection with text
    InsertText(String),
    /// Delete the selected range
    DeleteSelection,

    // Marks
    /// Add or remove bold/italic/underline over the selection
    ToggleMark(MarkType),
    /// Link the selection, or the link around a caret
    SetLink { href: String, label: Option<String> },
    /// Remove links from the selection, or the link around a caret
    UnsetLink,

    // Blocks
    SetBlockType(BlockType),
    ToggleList { ordered: bool },
    /// Replace the selection with a block node
    InsertNode(Node),
    /// Replace the attributes of the node starting at `pos`
    SetNodeAttrs { pos: usize, kind: NodeKind },

    // Selection
    SetSelection(Selection),
    SelectAll,
    /// Grow a caret to the range of the mark around it
    ExtendMarkRange(MarkType),
}

impl Command {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Command::InsertText(_) => "Insert Text",
            Command::DeleteSelection => "Delete Selection",
            Command::ToggleMark(MarkType::Bold) => "Toggle Bold",
            Command::ToggleMark(MarkType::Italic) => "Toggle Italic",
            Command::ToggleMark(MarkType::Underline) => "Toggle Underline",
            Command::ToggleMark(MarkType::Link) => "Toggle Link",
            Command::SetLink { .. } => "Set Link",
            Command::UnsetLink => "Remove Link",
            Command::SetBlockType(BlockType::Paragraph) => "Paragraph",
            Command::SetBlockType(BlockType::Heading(_)) => "Heading",
            Command::ToggleList { ordered: false } => "Bullet List",
            Command::ToggleList { ordered: true } => "Ordered List",
            Command::InsertNode(_) => "Insert Node",
            Command::SetNodeAttrs { .. } => "Set Node Attributes",
            Command::SetSelection(_) => "Set Selection",
            Command::SelectAll => "Select All",
            Command::ExtendMarkRange(_) => "Extend Mark Range",
        }
    }

    /// Returns true if the command only moves the selection.
    pub fn is_selection_only(&self) -> bool {
        matches!(
            self,
            Command::SetSelection(_) | Command::SelectAll | Command::ExtendMarkRange(_)
        )
    }
}

/// A named toolbar action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Underline,
    UnsetLink,
    Paragraph,
    Heading(u8),
    BulletList,
    OrderedList,
    HorizontalRule,
    SelectAll,
    DeleteSelection,
    Undo,
    Redo,
}

impl ToolbarAction {
    /// Parses a toolbar name such as `bold` or `heading2`.
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "bold" => ToolbarAction::Bold,
            "italic" => ToolbarAction::Italic,
            "underline" => ToolbarAction::Underline,
            "unsetLink" => ToolbarAction::UnsetLink,
            "paragraph" => ToolbarAction::Paragraph,
            "bulletList" => ToolbarAction::BulletList,
            "orderedList" => ToolbarAction::OrderedList,
            "horizontalRule" => ToolbarAction::HorizontalRule,
            "selectAll" => ToolbarAction::SelectAll,
            "deleteSelection" => ToolbarAction::DeleteSelection,
            "undo" => ToolbarAction::Undo,
            "redo" => ToolbarAction::Redo,
            _ => {
                let level: u8 = name.strip_prefix("heading")?.parse().ok()?;
                if !(1..=6).contains(&level) {
                    return None;
                }
                ToolbarAction::Heading(level)
            }
        };
        Some(action)
    }

    /// Returns the document command behind the action.
    ///
    /// `Undo` and `Redo` act on the history rather than the document and
    /// have no command.
    pub fn command(&self) -> Option<Command> {
        Some(match *self {
            ToolbarAction::Bold => Command::ToggleMark(MarkType::Bold),
            ToolbarAction::Italic => Command::ToggleMark(MarkType::Italic),
            ToolbarAction::Underline => Command::ToggleMark(MarkType::Underline),
            ToolbarAction::UnsetLink => Command::UnsetLink,
            ToolbarAction::Paragraph => Command::SetBlockType(BlockType::Paragraph),
            ToolbarAction::Heading(level) => Command::SetBlockType(BlockType::Heading(level)),
            ToolbarAction::BulletList => Command::ToggleList { ordered: false },
            ToolbarAction::OrderedList => Command::ToggleList { ordered: true },
            ToolbarAction::HorizontalRule => Command::InsertNode(Node::horizontal_rule()),
            ToolbarAction::SelectAll => Command::SelectAll,
            ToolbarAction::DeleteSelection => Command::DeleteSelection,
            ToolbarAction::Undo | ToolbarAction::Redo => return None,
        })
    }
}

impl fmt::Display for ToolbarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolbarAction::Bold => write!(f, "bold"),
            ToolbarAction::Italic => write!(f, "italic"),
            ToolbarAction::Underline => write!(f, "underline"),
            ToolbarAction::UnsetLink => write!(f, "unsetLink"),
            ToolbarAction::Paragraph => write!(f, "paragraph"),
            ToolbarAction::Heading(level) => write!(f, "heading{}", level),
            ToolbarAction::BulletList => write!(f, "bulletList"),
            ToolbarAction::OrderedList => write!(f, "orderedList"),
            ToolbarAction::HorizontalRule => write!(f, "horizontalRule"),
            ToolbarAction::SelectAll => write!(f, "selectAll"),
            ToolbarAction::DeleteSelection => write!(f, "deleteSelection"),
            ToolbarAction::Undo => write!(f, "undo"),
            ToolbarAction::Redo => write!(f, "redo"),
        }
    }
}
