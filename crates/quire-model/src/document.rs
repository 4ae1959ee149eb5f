//! The document: a versioned, schema-valid tree of nodes.
//!
//! ## Position Addressing
//!
//! Positions are integer offsets into the flattened tree:
//!
//! ```text
//!  <p> a b <a> c d e f </a> g </p>
//! 0   1 2 3   3 4 5 6 7    7 8   9
//! ```
//!
//! - a character counts 1
//! - a leaf node (image, video, rule) counts 1
//! - any other node counts 2 for its open and close tokens, plus its content
//!
//! The root contributes no tokens, so positions run from `0` to
//! [`Document::size`]. Marks are not tokens: the link above spans `3..7`.

use crate::node::{Node, NodeKind};
use crate::schema::{NodeType, Schema};
use crate::{ModelError, ModelResult};

/// A versioned document.
///
/// Equality compares content only; two documents holding the same tree
/// are equal regardless of their version.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    version: u64,
}

/// Where a position falls in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPos {
    /// Inside a textblock, `offset` characters into its content.
    Inline {
        path: Vec<usize>,
        offset: usize,
        content_start: usize,
    },
    /// Between block children of the container at `parent`, before child `index`.
    Between { parent: Vec<usize>, index: usize },
}

/// A textblock found while walking the document.
#[derive(Debug, Clone)]
pub struct TextblockRef<'a> {
    pub path: Vec<usize>,
    pub node: &'a Node,
    /// Position of the first character slot.
    pub content_start: usize,
}

impl TextblockRef<'_> {
    /// Position right after the last character.
    pub fn content_end(&self) -> usize {
        self.content_start + self.node.content_size()
    }
}

impl Document {
    /// Creates the empty document: a single empty paragraph.
    pub fn empty() -> Self {
        Self {
            root: Node::doc(vec![Node::empty_textblock(NodeKind::Paragraph)]),
            version: 0,
        }
    }

    /// Creates a document from block nodes, validating them.
    pub fn from_blocks(blocks: Vec<Node>, schema: &Schema) -> ModelResult<Self> {
        let root = Node::doc(blocks);
        schema.validate(&root)?;
        Ok(Self { root, version: 0 })
    }

    /// Wraps an already validated root as version 0.
    pub(crate) fn from_root(root: Node) -> Self {
        Self { root, version: 0 }
    }

    /// Creates the next version of this document holding `root`.
    ///
    /// Callers are expected to have validated `root`.
    pub fn successor(&self, root: Node) -> Self {
        Self {
            root,
            version: self.version + 1,
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the top-level blocks.
    pub fn blocks(&self) -> &[Node] {
        self.root.children()
    }

    /// Returns the version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the largest valid position.
    pub fn size(&self) -> usize {
        self.root.content_size()
    }

    /// Returns true if the document is a single empty paragraph.
    pub fn is_empty(&self) -> bool {
        matches!(self.blocks(), [only] if only.node_type() == NodeType::Paragraph && only.runs().is_empty())
    }

    /// Returns the plain text, blocks separated by newlines.
    pub fn text(&self) -> String {
        self.root.text_content()
    }

    /// Fails unless `pos` lies in `0..=size`.
    pub fn check_position(&self, pos: usize) -> ModelResult<()> {
        let size = self.size();
        if pos > size {
            return Err(ModelError::PositionOutOfBounds { pos, size });
        }
        Ok(())
    }

    /// Classifies a position.
    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        self.check_position(pos)?;
        Ok(resolve_in(&self.root, Vec::new(), 0, pos))
    }

    /// Returns the node that starts at `pos`, with its path.
    pub fn node_at(&self, pos: usize) -> Option<(Vec<usize>, &Node)> {
        match self.resolve(pos).ok()? {
            ResolvedPos::Between { parent, index } => {
                let mut path = parent;
                path.push(index);
                let node = self.root.descendant(&path)?;
                Some((path, node))
            }
            ResolvedPos::Inline { .. } => None,
        }
    }

    /// Returns every textblock in document order.
    pub fn textblocks(&self) -> Vec<TextblockRef<'_>> {
        let mut out = Vec::new();
        collect_textblocks(&self.root, &mut Vec::new(), 0, &mut out);
        out
    }

    /// Returns the textblock whose content contains or touches `pos`.
    pub fn textblock_at(&self, pos: usize) -> Option<TextblockRef<'_>> {
        self.textblocks()
            .into_iter()
            .find(|tb| tb.content_start <= pos && pos <= tb.content_end())
    }

    /// Returns the closest position at or after `pos` where text can go.
    ///
    /// Falls back to the end of the last textblock when none follows, and
    /// to `pos` itself in a document without textblocks.
    pub fn text_position_near(&self, pos: usize) -> usize {
        let textblocks = self.textblocks();
        match textblocks.iter().find(|tb| tb.content_end() >= pos) {
            Some(tb) => pos.max(tb.content_start),
            None => textblocks.last().map_or(pos, |tb| tb.content_end()),
        }
    }

    /// Returns the textblocks whose content overlaps or touches `from..to`.
    pub fn textblocks_between(&self, from: usize, to: usize) -> Vec<TextblockRef<'_>> {
        self.textblocks()
            .into_iter()
            .filter(|tb| tb.content_start <= to && tb.content_end() >= from)
            .collect()
    }

    /// Returns the plain text between two positions.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        self.textblocks_between(from, to)
            .iter()
            .map(|tb| {
                let lo = from.max(tb.content_start) - tb.content_start;
                let hi = to.min(tb.content_end()) - tb.content_start;
                crate::inline::slice(tb.node.runs(), lo, hi)
                    .into_iter()
                    .map(|r| r.text)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for Document {}

fn resolve_in(container: &Node, path: Vec<usize>, start: usize, pos: usize) -> ResolvedPos {
    let mut cursor = start;
    for (index, child) in container.children().iter().enumerate() {
        if pos == cursor {
            return ResolvedPos::Between {
                parent: path,
                index,
            };
        }
        let end = cursor + child.size();
        if pos < end {
            let mut child_path = path;
            child_path.push(index);
            if child.is_textblock() {
                return ResolvedPos::Inline {
                    path: child_path,
                    offset: pos - (cursor + 1),
                    content_start: cursor + 1,
                };
            }
            return resolve_in(child, child_path, cursor + 1, pos);
        }
        cursor = end;
    }
    ResolvedPos::Between {
        parent: path,
        index: container.children().len(),
    }
}

fn collect_textblocks<'a>(
    container: &'a Node,
    path: &mut Vec<usize>,
    start: usize,
    out: &mut Vec<TextblockRef<'a>>,
) {
    let mut cursor = start;
    for (index, child) in container.children().iter().enumerate() {
        path.push(index);
        if child.is_textblock() {
            out.push(TextblockRef {
                path: path.clone(),
                node: child,
                content_start: cursor + 1,
            });
        } else if !child.is_leaf() {
            collect_textblocks(child, path, cursor + 1, out);
        }
        path.pop();
        cursor += child.size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Mark, TextRun};

    fn sample() -> Document {
        Document::from_blocks(
            vec![
                Node::paragraph(vec![
                    TextRun::plain("ab"),
                    TextRun::marked("cdef", [Mark::link("https://x.dev", None)]),
                    TextRun::plain("g"),
                ]),
                Node::image("/cat.png", None),
                Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                    TextRun::plain("item"),
                ])])]),
            ],
            &Schema::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_size() {
        // paragraph 9, image 1, list 2 + item 2 + paragraph 6
        assert_eq!(sample().size(), 20);
    }

    #[test]
    fn test_resolve_inline() {
        let doc = sample();
        assert_eq!(
            doc.resolve(3).unwrap(),
            ResolvedPos::Inline {
                path: vec![0],
                offset: 2,
                content_start: 1
            }
        );
    }

    #[test]
    fn test_resolve_between_blocks() {
        let doc = sample();
        assert_eq!(
            doc.resolve(9).unwrap(),
            ResolvedPos::Between {
                parent: vec![],
                index: 1
            }
        );
        assert_eq!(
            doc.resolve(20).unwrap(),
            ResolvedPos::Between {
                parent: vec![],
                index: 3
            }
        );
    }

    #[test]
    fn test_resolve_nested() {
        let doc = sample();
        // list opens at 10, item at 11, paragraph at 12, content at 13
        assert_eq!(
            doc.resolve(13).unwrap(),
            ResolvedPos::Inline {
                path: vec![2, 0, 0],
                offset: 0,
                content_start: 13
            }
        );
        assert_eq!(
            doc.resolve(11).unwrap(),
            ResolvedPos::Between {
                parent: vec![2],
                index: 0
            }
        );
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            sample().resolve(21),
            Err(ModelError::PositionOutOfBounds { pos: 21, size: 20 })
        ));
    }

    #[test]
    fn test_node_at() {
        let doc = sample();
        let (path, node) = doc.node_at(9).unwrap();
        assert_eq!(path, vec![1]);
        assert_eq!(node.node_type(), NodeType::Image);
    }

    #[test]
    fn test_text_position_near() {
        let doc = sample();
        assert_eq!(doc.text_position_near(0), 1);
        assert_eq!(doc.text_position_near(4), 4);
        // past the image, into the list item's paragraph
        assert_eq!(doc.text_position_near(9), 13);
        assert_eq!(doc.text_position_near(doc.size()), 17);
        assert!(matches!(
            doc.resolve(doc.text_position_near(9)).unwrap(),
            ResolvedPos::Inline { offset: 0, .. }
        ));
    }

    #[test]
    fn test_text_between() {
        let doc = sample();
        assert_eq!(doc.text_between(2, 6), "bcde");
        assert_eq!(doc.text_between(7, 15), "g\nit");
    }
}
