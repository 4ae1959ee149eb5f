//! Structural edits.
//!
//! Each function reads a [`Document`] and returns a new root [`Node`];
//! the input is never touched. Callers validate the result against the
//! schema and wrap it in the document's successor version.

use crate::document::{Document, ResolvedPos};
use crate::inline;
use crate::node::{Content, MarkSet, Node, NodeKind, TextRun};
use crate::schema::{MarkType, NodeType, Schema, SchemaViolation};
use crate::{ModelError, ModelResult};

// ==================== Deletion ====================

/// Deletes everything between two positions.
///
/// Blocks entirely inside the range disappear. Blocks cut by the range
/// keep their remaining halves, and the halves on either side of the
/// cut are joined. Containers left without children are removed, and a
/// document left without any textblock gets an empty paragraph where the
/// range began.
pub fn delete_range(doc: &Document, from: usize, to: usize) -> Node {
    let mut root = doc.root().clone();
    if from >= to {
        return root;
    }
    if let Some(children) = root.children_mut() {
        delete_in(children, 0, from, to);
    }
    prune(&mut root);
    if !has_textblock(&root) {
        if let Some(children) = root.children_mut() {
            let mut end = 0;
            let index = children
                .iter()
                .take_while(|child| {
                    end += child.size();
                    end <= from
                })
                .count();
            children.insert(index, Node::empty_textblock(NodeKind::Paragraph));
        }
    }
    root
}

fn has_textblock(node: &Node) -> bool {
    node.is_textblock() || node.children().iter().any(has_textblock)
}

fn delete_in(children: &mut Vec<Node>, start: usize, from: usize, to: usize) {
    let mut cursor = start;
    let mut kept: Vec<Node> = Vec::with_capacity(children.len());
    let mut cut: Vec<usize> = Vec::new();

    for mut child in children.drain(..) {
        let (cs, ce) = (cursor, cursor + child.size());
        cursor = ce;
        if ce <= from || cs >= to {
            kept.push(child);
            continue;
        }
        if from <= cs && ce <= to {
            continue;
        }
        match child.content_mut() {
            Content::Inline(runs) => {
                let lo = from.max(cs + 1) - (cs + 1);
                let hi = to.min(ce - 1) - (cs + 1);
                *runs = inline::delete(runs, lo, hi);
            }
            Content::Blocks(inner) => delete_in(inner, cs + 1, from, to),
            Content::Empty => {}
        }
        cut.push(kept.len());
        kept.push(child);
    }

    if let [a, b] = cut[..] {
        let second = kept.remove(b);
        if let Some(rest) = join(&mut kept[a], second) {
            kept.insert(b, rest);
        }
    }
    *children = kept;
}

/// Joins `b` onto the end of `a`. Returns whatever of `b` could not be absorbed.
fn join(a: &mut Node, b: Node) -> Option<Node> {
    let same_type = a.node_type() == b.node_type();
    let (b_kind, b_content) = b.into_parts();
    match b_content {
        Content::Inline(more) => match last_textblock_mut(a) {
            Some(target) => {
                append_runs(target, more);
                None
            }
            None => Some(Node::new(b_kind, Content::Inline(more))),
        },
        Content::Blocks(more) if a.is_textblock() => {
            let mut rest = Node::new(b_kind, Content::Blocks(more));
            if let Some(tail) = take_first_textblock(&mut rest) {
                append_runs(a, tail);
            }
            Some(rest)
        }
        Content::Blocks(mut more) if same_type => {
            let Some(children) = a.children_mut() else {
                return Some(Node::new(b_kind, Content::Blocks(more)));
            };
            if let Some(last) = children.last_mut() {
                if !more.is_empty() {
                    let first = more.remove(0);
                    if let Some(rest) = join(last, first) {
                        more.insert(0, rest);
                    }
                }
            }
            children.extend(more);
            None
        }
        content => Some(Node::new(b_kind, content)),
    }
}

fn append_runs(target: &mut Node, more: Vec<TextRun>) {
    let runs = inline::concat(target.runs().to_vec(), more);
    *target = target.with_runs(runs);
}

fn take_first_textblock(node: &mut Node) -> Option<Vec<TextRun>> {
    let children = node.children_mut()?;
    let first = children.first_mut()?;
    if first.is_textblock() {
        let removed = children.remove(0);
        return Some(removed.runs().to_vec());
    }
    take_first_textblock(first)
}

fn last_textblock_mut(node: &mut Node) -> Option<&mut Node> {
    if node.is_textblock() {
        return Some(node);
    }
    let last = node.children_mut()?.last_mut()?;
    last_textblock_mut(last)
}

fn prune(node: &mut Node) {
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            prune(child);
        }
        children.retain(|c| !matches!(c.content(), Content::Blocks(inner) if inner.is_empty()));
    }
}

// ==================== Text ====================

/// Inserts text at a caret inside a textblock.
///
/// Returns the new root and the caret position after the text. The
/// text picks up the marks around the caret, except that a link does
/// not grow past its own edges.
pub fn insert_text(doc: &Document, pos: usize, text: &str) -> ModelResult<(Node, usize)> {
    match doc.resolve(pos)? {
        ResolvedPos::Inline { path, offset, .. } => {
            let mut root = doc.root().clone();
            let block = root
                .descendant_mut(&path)
                .ok_or(ModelError::PositionOutOfBounds {
                    pos,
                    size: doc.size(),
                })?;
            let marks = inherited_marks(block.runs(), offset);
            let runs = inline::insert(block.runs(), offset, vec![TextRun::new(text, marks)]);
            *block = block.with_runs(runs);
            Ok((root, pos + text.chars().count()))
        }
        ResolvedPos::Between { parent, .. } => {
            let parent_type = doc
                .root()
                .descendant(&parent)
                .map(Node::node_type)
                .unwrap_or(NodeType::Doc);
            Err(SchemaViolation::TextNotAllowed(parent_type).into())
        }
    }
}

fn inherited_marks(runs: &[TextRun], offset: usize) -> MarkSet {
    let before = offset
        .checked_sub(1)
        .and_then(|i| inline::marks_at(runs, i));
    let after = inline::marks_at(runs, offset);
    let Some(marks) = before.or(after) else {
        return MarkSet::new();
    };
    let link_before = before.and_then(|m| m.get(MarkType::Link));
    let link_after = after.and_then(|m| m.get(MarkType::Link));
    if link_before.is_some() && link_before == link_after {
        marks.clone()
    } else {
        marks.without(MarkType::Link)
    }
}

// ==================== Blocks ====================

/// Inserts a block node at a position.
///
/// A caret inside a textblock splits it: the text before the caret stays
/// in front of the node (if there is any) and the text after it moves
/// into a block of the same kind behind the node, where the caret lands.
/// Between blocks, the node is inserted as-is and the caret lands after it.
pub fn insert_block(
    doc: &Document,
    pos: usize,
    node: Node,
    schema: &Schema,
) -> ModelResult<(Node, usize)> {
    let mut root = doc.root().clone();
    match doc.resolve(pos)? {
        ResolvedPos::Inline {
            path,
            offset,
            content_start,
        } => {
            let (index, parent_path) = match path.split_last() {
                Some((index, parent_path)) => (*index, parent_path.to_vec()),
                None => return Err(SchemaViolation::TextNotAllowed(NodeType::Doc).into()),
            };
            let parent = root
                .descendant_mut(&parent_path)
                .ok_or(ModelError::NoNodeAt { pos })?;
            check_child(schema, parent.node_type(), node.node_type())?;

            let children = parent.children_mut().ok_or(ModelError::NoNodeAt { pos })?;
            let block = children[index].clone();
            let (head, tail) = inline::split(block.runs(), offset);
            let block_start = content_start - 1;

            let mut replacement = Vec::with_capacity(3);
            let mut caret = block_start;
            if !head.is_empty() {
                let head_block = block.with_runs(head);
                caret += head_block.size();
                replacement.push(head_block);
            }
            caret += node.size() + 1;
            replacement.push(node);
            replacement.push(block.with_runs(tail));
            children.splice(index..=index, replacement);
            Ok((root, caret))
        }
        ResolvedPos::Between { parent, index } => {
            let container = root
                .descendant_mut(&parent)
                .ok_or(ModelError::NoNodeAt { pos })?;
            check_child(schema, container.node_type(), node.node_type())?;
            let caret = pos + node.size();
            container
                .children_mut()
                .ok_or(ModelError::NoNodeAt { pos })?
                .insert(index, node);
            Ok((root, caret))
        }
    }
}

fn check_child(schema: &Schema, parent: NodeType, child: NodeType) -> Result<(), SchemaViolation> {
    if schema.allows_child(parent, child) {
        Ok(())
    } else {
        Err(SchemaViolation::DisallowedChild { parent, child })
    }
}

// ==================== Marks and attributes ====================

/// Rewrites the marks of all text between two positions.
pub fn map_marks(
    doc: &Document,
    from: usize,
    to: usize,
    f: impl Fn(&MarkSet) -> MarkSet,
) -> Node {
    let targets: Vec<(Vec<usize>, usize, usize)> = doc
        .textblocks_between(from, to)
        .into_iter()
        .map(|tb| {
            let lo = from.max(tb.content_start) - tb.content_start;
            let hi = to.min(tb.content_end()) - tb.content_start;
            (tb.path, lo, hi)
        })
        .filter(|(_, lo, hi)| lo < hi)
        .collect();

    let mut root = doc.root().clone();
    for (path, lo, hi) in targets {
        if let Some(block) = root.descendant_mut(&path) {
            let runs = inline::map_marks(block.runs(), lo, hi, &f);
            *block = block.with_runs(runs);
        }
    }
    root
}

/// Returns true if every character between the positions carries `mark_type`.
///
/// Ranges containing no text return false.
pub fn range_has_mark(doc: &Document, from: usize, to: usize, mark_type: MarkType) -> bool {
    let mut saw_text = false;
    for tb in doc.textblocks_between(from, to) {
        let lo = from.max(tb.content_start) - tb.content_start;
        let hi = to.min(tb.content_end()) - tb.content_start;
        if lo >= hi {
            continue;
        }
        saw_text = true;
        if !inline::all_have(tb.node.runs(), lo, hi, mark_type) {
            return false;
        }
    }
    saw_text
}

/// Changes the kind of every textblock touched by the range.
pub fn set_textblock_kind(doc: &Document, from: usize, to: usize, kind: &NodeKind) -> Node {
    let paths: Vec<Vec<usize>> = doc
        .textblocks_between(from, to)
        .into_iter()
        .map(|tb| tb.path)
        .collect();
    let mut root = doc.root().clone();
    for path in paths {
        if let Some(block) = root.descendant_mut(&path) {
            *block = block.with_kind(kind.clone());
        }
    }
    root
}

/// Replaces the attributes of the node starting at `pos`.
pub fn set_node_kind(doc: &Document, pos: usize, kind: NodeKind) -> ModelResult<Node> {
    let (path, node) = doc.node_at(pos).ok_or(ModelError::NoNodeAt { pos })?;
    if node.node_type() != kind.node_type() {
        return Err(SchemaViolation::TypeChange(node.node_type()).into());
    }
    let mut root = doc.root().clone();
    let target = root
        .descendant_mut(&path)
        .ok_or(ModelError::NoNodeAt { pos })?;
    *target = target.with_kind(kind);
    Ok(root)
}

// ==================== Lists ====================

/// Wraps or unwraps the top-level blocks touched by a range as a list.
///
/// If every touched block already is a list of the requested kind, the
/// lists are dissolved into their items' blocks. Otherwise textblocks
/// become single-paragraph items, existing lists contribute their items,
/// and everything is gathered into one list of the requested kind.
pub fn toggle_list(doc: &Document, from: usize, to: usize, ordered: bool) -> ModelResult<Node> {
    let wanted = if ordered {
        NodeType::OrderedList
    } else {
        NodeType::BulletList
    };
    let blocks = doc.blocks();

    let mut touched = Vec::new();
    let mut cursor = 0;
    for (i, block) in blocks.iter().enumerate() {
        let end = cursor + block.size();
        let touches = if from == to {
            cursor < from && from < end
        } else {
            cursor < to && end > from
        };
        if touches {
            touched.push(i);
        }
        cursor = end;
    }
    let (Some(&first), Some(&last)) = (touched.first(), touched.last()) else {
        return Ok(doc.root().clone());
    };

    let range = &blocks[first..=last];
    let replacement: Vec<Node> = if range.iter().all(|b| b.node_type() == wanted) {
        range
            .iter()
            .flat_map(|list| list.children())
            .flat_map(|item| item.children().iter().cloned())
            .collect()
    } else {
        let mut items = Vec::new();
        for block in range {
            match block.node_type() {
                NodeType::Paragraph => items.push(Node::list_item(vec![block.clone()])),
                NodeType::BulletList | NodeType::OrderedList => {
                    items.extend(block.children().iter().cloned())
                }
                other => {
                    return Err(SchemaViolation::DisallowedChild {
                        parent: NodeType::ListItem,
                        child: other,
                    }
                    .into());
                }
            }
        }
        let list = if ordered {
            Node::ordered_list(items)
        } else {
            Node::bullet_list(items)
        };
        vec![list]
    };

    let mut children = blocks.to_vec();
    children.splice(first..=last, replacement);
    Ok(doc.root().with_children(children))
}

// ==================== Position mapping ====================

/// Maps a position across an edit that kept every textblock's text intact.
///
/// Positions inside the n-th textblock map to the same offset in the n-th
/// textblock of `after`; anything else is clamped to the new size.
pub fn map_position(before: &Document, after: &Document, pos: usize) -> usize {
    let old_blocks = before.textblocks();
    let new_blocks = after.textblocks();
    old_blocks
        .iter()
        .position(|tb| tb.content_start <= pos && pos <= tb.content_end())
        .and_then(|k| {
            let old = &old_blocks[k];
            new_blocks.get(k).map(|new| {
                (new.content_start + (pos - old.content_start)).min(new.content_end())
            })
        })
        .unwrap_or_else(|| pos.min(after.size()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mark;

    fn schema() -> Schema {
        Schema::default()
    }

    fn para(text: &str) -> Node {
        Node::paragraph(vec![TextRun::plain(text)])
    }

    fn doc(blocks: Vec<Node>) -> Document {
        Document::from_blocks(blocks, &schema()).unwrap()
    }

    #[test]
    fn test_delete_within_block() {
        let d = doc(vec![para("hello")]);
        let root = delete_range(&d, 2, 4);
        assert_eq!(root.children(), &[para("hlo")]);
    }

    #[test]
    fn test_delete_joins_blocks() {
        // <p>abc</p><p>def</p>: "c" at 3..4, "d" at 6..7
        let d = doc(vec![para("abc"), para("def")]);
        let root = delete_range(&d, 3, 7);
        assert_eq!(root.children(), &[para("abef")]);
    }

    #[test]
    fn test_delete_everything_leaves_paragraph() {
        let d = doc(vec![para("abc"), Node::image("/a.png", None)]);
        let root = delete_range(&d, 0, d.size());
        assert_eq!(root.children(), &[Node::empty_textblock(NodeKind::Paragraph)]);
    }

    #[test]
    fn test_delete_last_textblock_leaves_paragraph_in_place() {
        let image = Node::image("/a.png", None);
        let d = doc(vec![image.clone(), para("abc")]);
        // image 0..1, paragraph 1..6
        let root = delete_range(&d, 1, 6);
        assert_eq!(
            root.children(),
            &[image, Node::empty_textblock(NodeKind::Paragraph)]
        );
    }

    #[test]
    fn test_delete_into_list_pulls_text_up() {
        let list = Node::bullet_list(vec![
            Node::list_item(vec![para("one")]),
            Node::list_item(vec![para("two")]),
        ]);
        // <p>ab</p> 0..4, list opens at 4, first item 5, its paragraph 6, "one" at 7..10
        let d = doc(vec![para("ab"), list]);
        let root = delete_range(&d, 2, 8);
        assert_eq!(root.children()[0], para("ane"));
        assert_eq!(
            root.children()[1],
            Node::bullet_list(vec![Node::list_item(vec![para("two")])])
        );
    }

    #[test]
    fn test_insert_text_inherits_marks_but_not_link_edge() {
        let d = doc(vec![Node::paragraph(vec![
            TextRun::marked("ab", [Mark::Bold, Mark::link("https://a.dev", None)]),
            TextRun::plain("c"),
        ])]);
        let (root, caret) = insert_text(&d, 3, "X").unwrap();
        assert_eq!(caret, 4);
        assert_eq!(
            root.children()[0].runs(),
            &[
                TextRun::marked("ab", [Mark::Bold, Mark::link("https://a.dev", None)]),
                TextRun::marked("X", [Mark::Bold]),
                TextRun::plain("c"),
            ]
        );
    }

    #[test]
    fn test_insert_text_between_blocks_is_rejected() {
        let d = doc(vec![Node::image("/a.png", None)]);
        assert!(matches!(
            insert_text(&d, 0, "x"),
            Err(ModelError::Schema(SchemaViolation::TextNotAllowed(NodeType::Doc)))
        ));
    }

    #[test]
    fn test_insert_block_splits_paragraph() {
        let d = doc(vec![para("abcd")]);
        let (root, caret) = insert_block(&d, 3, Node::horizontal_rule(), &schema()).unwrap();
        assert_eq!(
            root.children(),
            &[para("ab"), Node::horizontal_rule(), para("cd")]
        );
        // <p>ab</p> 0..4, <hr> 4..5, tail paragraph content starts at 6
        assert_eq!(caret, 6);
    }

    #[test]
    fn test_insert_block_at_end_keeps_empty_tail() {
        let d = doc(vec![para("ab")]);
        let (root, caret) = insert_block(&d, 3, Node::horizontal_rule(), &schema()).unwrap();
        assert_eq!(
            root.children(),
            &[para("ab"), Node::horizontal_rule(), Node::empty_textblock(NodeKind::Paragraph)]
        );
        assert_eq!(caret, 6);
    }

    #[test]
    fn test_insert_block_into_list_item_rejected() {
        let list = Node::bullet_list(vec![Node::list_item(vec![para("one")])]);
        let d = doc(vec![list]);
        let result = insert_block(&d, 4, Node::image("/a.png", None), &schema());
        assert!(matches!(
            result,
            Err(ModelError::Schema(SchemaViolation::DisallowedChild {
                parent: NodeType::ListItem,
                child: NodeType::Image
            }))
        ));
    }

    #[test]
    fn test_toggle_list_round_trip() {
        let d = doc(vec![para("one"), para("two")]);
        let wrapped = Document::from_blocks(
            toggle_list(&d, 1, 7, false).unwrap().children().to_vec(),
            &schema(),
        )
        .unwrap();
        assert_eq!(wrapped.blocks().len(), 1);
        assert_eq!(wrapped.blocks()[0].node_type(), NodeType::BulletList);

        let unwrapped = toggle_list(&wrapped, 4, 4, false).unwrap();
        assert_eq!(unwrapped.children(), &[para("one"), para("two")]);
    }

    #[test]
    fn test_toggle_list_rejects_headings() {
        let d = doc(vec![Node::heading(2, vec![TextRun::plain("Title")])]);
        assert!(matches!(
            toggle_list(&d, 1, 1, false),
            Err(ModelError::Schema(SchemaViolation::DisallowedChild {
                parent: NodeType::ListItem,
                child: NodeType::Heading
            }))
        ));
    }

    #[test]
    fn test_toggle_list_rejects_images() {
        let d = doc(vec![para("one"), Node::image("/a.png", None)]);
        assert!(toggle_list(&d, 1, d.size(), true).is_err());
    }

    #[test]
    fn test_map_position_across_wrap() {
        let before = doc(vec![para("one")]);
        let after = before.successor(toggle_list(&before, 2, 2, false).unwrap());
        // paragraph content moved from 1 to 3 (list + item opened in front)
        assert_eq!(map_position(&before, &after, 2), 4);
    }
}
