//! The content schema: which nodes may contain what, and which marks exist.
//!
//! ## Learning: Closed Sets as Enums
//!
//! Editors written in dynamic languages usually register node and mark
//! types at runtime. Here the set is closed: `NodeType` and `MarkType`
//! are plain enums, and every content rule is a `match`. Adding a node
//! type means adding a variant, and the compiler points at every rule
//! that has to learn about it.

use serde::{Deserialize, Serialize};

use crate::node::{Content, Mark, Node, NodeKind};

/// Every kind of node a document can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    Image,
    Video,
    HorizontalRule,
}

impl NodeType {
    /// Returns the node type's name.
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::Blockquote => "blockquote",
            NodeType::BulletList => "bullet_list",
            NodeType::OrderedList => "ordered_list",
            NodeType::ListItem => "list_item",
            NodeType::Image => "image",
            NodeType::Video => "video",
            NodeType::HorizontalRule => "horizontal_rule",
        }
    }

    /// Returns true for nodes whose content is inline text.
    pub fn is_textblock(&self) -> bool {
        matches!(self, NodeType::Paragraph | NodeType::Heading)
    }

    /// Returns true for nodes that never have content.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeType::Image | NodeType::Video | NodeType::HorizontalRule
        )
    }

    /// Returns true for list containers.
    pub fn is_list(&self) -> bool {
        matches!(self, NodeType::BulletList | NodeType::OrderedList)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every kind of inline mark.
///
/// The declaration order is the canonical nesting order used by the
/// serializer: links wrap everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkType {
    Link,
    Bold,
    Italic,
    Underline,
}

impl MarkType {
    /// Returns the mark type's name.
    pub fn name(&self) -> &'static str {
        match self {
            MarkType::Link => "link",
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Underline => "underline",
        }
    }

    /// Parses a mark type from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "link" => Some(MarkType::Link),
            "bold" => Some(MarkType::Bold),
            "italic" => Some(MarkType::Italic),
            "underline" => Some(MarkType::Underline),
            _ => None,
        }
    }

    /// Returns true if this mark cannot coexist with `other` on the same text.
    ///
    /// No pair of marks in this schema excludes each other; a run can be
    /// bold, italic, underlined and linked at once.
    pub fn excludes(&self, _other: MarkType) -> bool {
        false
    }
}

impl std::fmt::Display for MarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node type may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// Block children drawn from `allowed`, at least `min` of them.
    Blocks {
        allowed: &'static [NodeType],
        min: usize,
    },
    /// Inline text runs.
    Inline,
    /// No content at all.
    Leaf,
}

const DOC_CONTENT: &[NodeType] = &[
    NodeType::Paragraph,
    NodeType::Heading,
    NodeType::Blockquote,
    NodeType::BulletList,
    NodeType::OrderedList,
    NodeType::Image,
    NodeType::Video,
    NodeType::HorizontalRule,
];

const QUOTE_CONTENT: &[NodeType] = &[
    NodeType::Paragraph,
    NodeType::Heading,
    NodeType::BulletList,
    NodeType::OrderedList,
];

const LIST_CONTENT: &[NodeType] = &[NodeType::ListItem];

const ITEM_CONTENT: &[NodeType] = &[
    NodeType::Paragraph,
    NodeType::BulletList,
    NodeType::OrderedList,
];

/// A content rule was broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("{parent} cannot contain {child}")]
    DisallowedChild { parent: NodeType, child: NodeType },

    #[error("{node} requires at least {min} child node(s)")]
    TooFewChildren { node: NodeType, min: usize },

    #[error("{0} only accepts inline content")]
    ExpectedInline(NodeType),

    #[error("{0} cannot contain inline content")]
    UnexpectedInline(NodeType),

    #[error("{0} is a leaf and cannot have content")]
    LeafWithContent(NodeType),

    #[error("text is not allowed directly inside {0}")]
    TextNotAllowed(NodeType),

    #[error("empty text runs are not allowed")]
    EmptyTextRun,

    #[error("adjacent text runs with identical marks must be merged")]
    UnmergedRuns,

    #[error("invalid attribute on {node}: {reason}")]
    InvalidAttribute { node: NodeType, reason: String },

    #[error("invalid {mark} mark: {reason}")]
    InvalidMark { mark: MarkType, reason: String },

    #[error("{0} cannot be changed into a different node type")]
    TypeChange(NodeType),
}

/// The fixed content schema of an editing session.
///
/// A `Schema` is a plain value: build it once when the session starts
/// and pass it by reference. Nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    max_heading_level: u8,
}

impl Schema {
    /// Creates a schema allowing headings up to `max_heading_level` (clamped to 1..=6).
    pub fn new(max_heading_level: u8) -> Self {
        Self {
            max_heading_level: max_heading_level.clamp(1, 6),
        }
    }

    /// Returns the deepest heading level allowed.
    pub fn max_heading_level(&self) -> u8 {
        self.max_heading_level
    }

    /// Returns the content rule for a node type.
    pub fn content_rule(&self, node_type: NodeType) -> ContentRule {
        match node_type {
            NodeType::Doc => ContentRule::Blocks {
                allowed: DOC_CONTENT,
                min: 1,
            },
            NodeType::Blockquote => ContentRule::Blocks {
                allowed: QUOTE_CONTENT,
                min: 1,
            },
            NodeType::BulletList | NodeType::OrderedList => ContentRule::Blocks {
                allowed: LIST_CONTENT,
                min: 1,
            },
            NodeType::ListItem => ContentRule::Blocks {
                allowed: ITEM_CONTENT,
                min: 1,
            },
            NodeType::Paragraph | NodeType::Heading => ContentRule::Inline,
            NodeType::Image | NodeType::Video | NodeType::HorizontalRule => ContentRule::Leaf,
        }
    }

    /// Returns true if `parent` accepts `child` as a direct child.
    pub fn allows_child(&self, parent: NodeType, child: NodeType) -> bool {
        match self.content_rule(parent) {
            ContentRule::Blocks { allowed, .. } => allowed.contains(&child),
            ContentRule::Inline | ContentRule::Leaf => false,
        }
    }

    /// Validates a node and its entire subtree.
    pub fn validate(&self, node: &Node) -> Result<(), SchemaViolation> {
        let node_type = node.node_type();
        self.validate_attrs(node.kind())?;

        match (self.content_rule(node_type), node.content()) {
            (ContentRule::Blocks { allowed, min }, Content::Blocks(children)) => {
                if children.len() < min {
                    return Err(SchemaViolation::TooFewChildren {
                        node: node_type,
                        min,
                    });
                }
                for child in children {
                    if !allowed.contains(&child.node_type()) {
                        return Err(SchemaViolation::DisallowedChild {
                            parent: node_type,
                            child: child.node_type(),
                        });
                    }
                    self.validate(child)?;
                }
                Ok(())
            }
            (ContentRule::Blocks { .. }, Content::Inline(runs)) if !runs.is_empty() => {
                Err(SchemaViolation::UnexpectedInline(node_type))
            }
            (ContentRule::Blocks { min, .. }, _) => Err(SchemaViolation::TooFewChildren {
                node: node_type,
                min,
            }),
            (ContentRule::Inline, Content::Inline(runs)) => {
                for (i, run) in runs.iter().enumerate() {
                    if run.text.is_empty() {
                        return Err(SchemaViolation::EmptyTextRun);
                    }
                    if i > 0 && runs[i - 1].marks == run.marks {
                        return Err(SchemaViolation::UnmergedRuns);
                    }
                    for mark in run.marks.iter() {
                        self.validate_mark(mark)?;
                    }
                }
                Ok(())
            }
            (ContentRule::Inline, Content::Empty) => Ok(()),
            (ContentRule::Inline, Content::Blocks(_)) => {
                Err(SchemaViolation::ExpectedInline(node_type))
            }
            (ContentRule::Leaf, Content::Empty) => Ok(()),
            (ContentRule::Leaf, _) => Err(SchemaViolation::LeafWithContent(node_type)),
        }
    }

    /// Validates node attributes only.
    pub fn validate_attrs(&self, kind: &NodeKind) -> Result<(), SchemaViolation> {
        match kind {
            NodeKind::Heading { level } => {
                if *level == 0 || *level > self.max_heading_level {
                    return Err(SchemaViolation::InvalidAttribute {
                        node: NodeType::Heading,
                        reason: format!(
                            "level {} is outside 1..={}",
                            level, self.max_heading_level
                        ),
                    });
                }
                Ok(())
            }
            NodeKind::Image { src, .. } => {
                if src.trim().is_empty() {
                    return Err(SchemaViolation::InvalidAttribute {
                        node: NodeType::Image,
                        reason: "src must not be empty".to_string(),
                    });
                }
                Ok(())
            }
            NodeKind::Video { video_id } => {
                let valid = !video_id.is_empty()
                    && video_id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if !valid {
                    return Err(SchemaViolation::InvalidAttribute {
                        node: NodeType::Video,
                        reason: format!("invalid video id {:?}", video_id),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Validates a mark's attributes.
    pub fn validate_mark(&self, mark: &Mark) -> Result<(), SchemaViolation> {
        if let Mark::Link { href, .. } = mark {
            let reason = if href.trim().is_empty() {
                Some("href must not be empty")
            } else if href.chars().any(|c| c.is_whitespace() || c.is_control()) {
                Some("href must not contain whitespace")
            } else if href.to_ascii_lowercase().starts_with("javascript:") {
                Some("javascript: links are not allowed")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SchemaViolation::InvalidMark {
                    mark: MarkType::Link,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(6)
    }
}
