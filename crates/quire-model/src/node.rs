//! Nodes, marks and text runs.
//!
//! ## Learning: Data-Carrying Enums
//!
//! `NodeKind` keeps each node's attributes inside its variant, so a
//! heading cannot exist without a level and an image cannot exist
//! without a source. `Content` says what sits inside a node: block
//! children, inline runs, or nothing.

use serde::{Deserialize, Serialize};

use crate::inline;
use crate::schema::{MarkType, NodeType};

/// An inline annotation over a text run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link {
        href: String,
        label: Option<String>,
    },
    Bold,
    Italic,
    Underline,
}

impl Mark {
    /// Creates a link mark.
    pub fn link(href: impl Into<String>, label: Option<String>) -> Self {
        Mark::Link {
            href: href.into(),
            label,
        }
    }

    /// Creates the attribute-free mark of a given type.
    ///
    /// Returns `None` for links, which need a target.
    pub fn simple(mark_type: MarkType) -> Option<Self> {
        match mark_type {
            MarkType::Bold => Some(Mark::Bold),
            MarkType::Italic => Some(Mark::Italic),
            MarkType::Underline => Some(Mark::Underline),
            MarkType::Link => None,
        }
    }

    /// Returns the type of this mark.
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Link { .. } => MarkType::Link,
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Underline => MarkType::Underline,
        }
    }
}

/// The marks on a text run: at most one per type, kept in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    /// Creates an empty mark set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if no marks are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of marks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates marks in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    /// Returns the mark of a given type, if present.
    pub fn get(&self, mark_type: MarkType) -> Option<&Mark> {
        self.0.iter().find(|m| m.mark_type() == mark_type)
    }

    /// Returns true if a mark of the given type is present.
    pub fn has(&self, mark_type: MarkType) -> bool {
        self.get(mark_type).is_some()
    }

    /// Returns a copy with `mark` added, replacing any mark of the same type.
    pub fn with(&self, mark: Mark) -> MarkSet {
        let mut marks: Vec<Mark> = self
            .0
            .iter()
            .filter(|m| m.mark_type() != mark.mark_type())
            .cloned()
            .collect();
        marks.push(mark);
        marks.sort_by_key(|m| m.mark_type());
        MarkSet(marks)
    }

    /// Returns a copy with every mark of `mark_type` removed.
    pub fn without(&self, mark_type: MarkType) -> MarkSet {
        MarkSet(
            self.0
                .iter()
                .filter(|m| m.mark_type() != mark_type)
                .cloned()
                .collect(),
        )
    }

    /// Returns the marks present in both sets with equal attributes.
    pub fn intersect(&self, other: &MarkSet) -> MarkSet {
        MarkSet(
            self.0
                .iter()
                .filter(|m| other.0.contains(m))
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MarkSet::new(), |set, mark| set.with(mark))
    }
}

/// A contiguous piece of text sharing one mark set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    /// Creates a run with the given marks.
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Creates an unmarked run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::new())
    }

    /// Creates a run carrying the given marks.
    pub fn marked(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self::new(text, marks.into_iter().collect())
    }

    /// Returns the length in characters (the unit positions count in).
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns true if the run holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A node's type together with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading { level: u8 },
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    Image { src: String, alt: Option<String> },
    Video { video_id: String },
    HorizontalRule,
}

impl NodeKind {
    /// Returns the attribute-free type of this kind.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Doc => NodeType::Doc,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::Blockquote => NodeType::Blockquote,
            NodeKind::BulletList => NodeType::BulletList,
            NodeKind::OrderedList => NodeType::OrderedList,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::Image { .. } => NodeType::Image,
            NodeKind::Video { .. } => NodeType::Video,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
        }
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Blocks(Vec<Node>),
    Inline(Vec<TextRun>),
    Empty,
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    content: Content,
}

impl Node {
    /// Creates a node from parts. Inline content is normalised.
    ///
    /// The result is not validated; see [`crate::Schema::validate`].
    pub fn new(kind: NodeKind, content: Content) -> Self {
        let content = match content {
            Content::Inline(runs) => Content::Inline(inline::normalize(runs)),
            other => other,
        };
        Self { kind, content }
    }

    pub fn doc(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Doc, Content::Blocks(children))
    }

    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Self::new(NodeKind::Paragraph, Content::Inline(runs))
    }

    pub fn heading(level: u8, runs: Vec<TextRun>) -> Self {
        Self::new(NodeKind::Heading { level }, Content::Inline(runs))
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Blockquote, Content::Blocks(children))
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::BulletList, Content::Blocks(items))
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::OrderedList, Content::Blocks(items))
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Self::new(NodeKind::ListItem, Content::Blocks(children))
    }

    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        Self::new(
            NodeKind::Image {
                src: src.into(),
                alt,
            },
            Content::Empty,
        )
    }

    pub fn video(video_id: impl Into<String>) -> Self {
        Self::new(
            NodeKind::Video {
                video_id: video_id.into(),
            },
            Content::Empty,
        )
    }

    pub fn horizontal_rule() -> Self {
        Self::new(NodeKind::HorizontalRule, Content::Empty)
    }

    /// Creates an empty textblock of the given kind.
    pub fn empty_textblock(kind: NodeKind) -> Self {
        Self::new(kind, Content::Inline(Vec::new()))
    }

    // ==================== Accessors ====================

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns block children (empty for textblocks and leaves).
    pub fn children(&self) -> &[Node] {
        match &self.content {
            Content::Blocks(children) => children,
            _ => &[],
        }
    }

    /// Returns inline runs (empty for containers and leaves).
    pub fn runs(&self) -> &[TextRun] {
        match &self.content {
            Content::Inline(runs) => runs,
            _ => &[],
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type().is_leaf()
    }

    // ==================== Measurements ====================

    /// Size of the node in positions, including its open and close tokens.
    pub fn size(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.content_size() + 2
        }
    }

    /// Size of the node's content in positions.
    pub fn content_size(&self) -> usize {
        match &self.content {
            Content::Blocks(children) => children.iter().map(Node::size).sum(),
            Content::Inline(runs) => runs.iter().map(TextRun::len).sum(),
            Content::Empty => 0,
        }
    }

    /// Concatenated text of the node, blocks separated by newlines.
    pub fn text_content(&self) -> String {
        match &self.content {
            Content::Inline(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
            Content::Blocks(children) => children
                .iter()
                .map(Node::text_content)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Content::Empty => String::new(),
        }
    }

    // ==================== Rebuilding ====================

    /// Returns a copy with different attributes and the same content.
    pub fn with_kind(&self, kind: NodeKind) -> Node {
        Node::new(kind, self.content.clone())
    }

    /// Returns a copy holding different inline runs.
    pub fn with_runs(&self, runs: Vec<TextRun>) -> Node {
        Node::new(self.kind.clone(), Content::Inline(runs))
    }

    /// Returns a copy holding different block children.
    pub fn with_children(&self, children: Vec<Node>) -> Node {
        Node::new(self.kind.clone(), Content::Blocks(children))
    }

    /// Consumes the node, returning its parts.
    pub fn into_parts(self) -> (NodeKind, Content) {
        (self.kind, self.content)
    }

    pub(crate) fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.content {
            Content::Blocks(children) => Some(children),
            _ => None,
        }
    }

    /// Follows a path of child indices.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children().get(i))
    }

    pub(crate) fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &i in path {
            node = node.children_mut()?.get_mut(i)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_set_canonical_order() {
        let set: MarkSet = [Mark::Underline, Mark::Bold, Mark::link("/a", None)]
            .into_iter()
            .collect();
        let types: Vec<MarkType> = set.iter().map(Mark::mark_type).collect();
        assert_eq!(
            types,
            vec![MarkType::Link, MarkType::Bold, MarkType::Underline]
        );
    }

    #[test]
    fn test_mark_set_replaces_same_type() {
        let set = MarkSet::new()
            .with(Mark::link("/a", None))
            .with(Mark::link("/b", None));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(MarkType::Link), Some(&Mark::link("/b", None)));
    }

    #[test]
    fn test_node_sizes() {
        let para = Node::paragraph(vec![TextRun::plain("héllo")]);
        assert_eq!(para.content_size(), 5);
        assert_eq!(para.size(), 7);

        let list = Node::bullet_list(vec![Node::list_item(vec![para.clone()])]);
        assert_eq!(list.size(), 11);
        assert_eq!(Node::image("/a.png", None).size(), 1);
    }

    #[test]
    fn test_paragraph_runs_normalised() {
        let para = Node::paragraph(vec![
            TextRun::plain("ab"),
            TextRun::plain(""),
            TextRun::plain("cd"),
        ]);
        assert_eq!(para.runs(), &[TextRun::plain("abcd")]);
    }
}
