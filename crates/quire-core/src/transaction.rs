//! The transaction engine.
//!
//! ## Learning: All-or-Nothing with Immutable Values
//!
//! A chain of commands runs against a working copy. Each step produces a
//! new root from the previous one and is validated against the schema
//! before the next step sees it. If any step fails, the working copy is
//! dropped and the caller still holds the untouched original; there is no
//! rollback code because nothing was ever mutated.

use quire_model::transform;
use quire_model::{
    Document, Mark, MarkType, ModelResult, Node, Schema, SchemaViolation, Selection, markup,
    resolve_mark_range,
};
use tracing::debug;

use crate::command::Command;

/// The outcome of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub document: Document,
    /// Selection recomputed against `document`.
    pub selection: Selection,
}

impl Applied {
    /// Returns true if the document differs from `before`.
    pub fn changed(&self, before: &Document) -> bool {
        self.document.version() != before.version()
    }
}

/// Applies commands to documents under a schema.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    schema: Schema,
}

impl Engine {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Applies one command.
    pub fn apply_command(
        &self,
        doc: &Document,
        selection: &Selection,
        command: &Command,
    ) -> ModelResult<Applied> {
        self.apply_chain(doc, selection, std::slice::from_ref(command))
    }

    /// Applies a chain of commands as one transaction.
    ///
    /// Either every command succeeds and the result carries at most one new
    /// document version, or the first failure is returned and nothing changed.
    /// A chain that leaves the tree as it was returns `doc` unchanged, version
    /// included.
    pub fn apply_chain(
        &self,
        doc: &Document,
        selection: &Selection,
        commands: &[Command],
    ) -> ModelResult<Applied> {
        selection.validate(doc)?;

        let mut working = doc.clone();
        let mut sel = *selection;
        for command in commands {
            let (root, next_sel) = self.step(&working, sel, command).inspect_err(|e| {
                debug!("Aborting transaction at {}: {}", command.display_name(), e);
            })?;
            if let Some(root) = root {
                self.schema.validate(&root)?;
                working = working.successor(root);
            }
            sel = next_sel;
            sel.validate(&working)?;
        }

        let document = if working.root() == doc.root() {
            doc.clone()
        } else {
            doc.successor(working.root().clone())
        };
        debug!(
            "Committed {} command(s), version {} -> {}",
            commands.len(),
            doc.version(),
            document.version()
        );
        Ok(Applied {
            document,
            selection: sel,
        })
    }

    /// Runs one command against the working copy.
    ///
    /// Returns the new root (`None` when the tree is unchanged) and the
    /// selection afterwards.
    fn step(
        &self,
        doc: &Document,
        sel: Selection,
        command: &Command,
    ) -> ModelResult<(Option<Node>, Selection)> {
        let (from, to) = (sel.from(), sel.to());
        match command {
            Command::InsertText(text) => {
                if text.is_empty() && sel.is_caret() {
                    return Ok((None, sel));
                }
                let (base, caret) = delete_selection(doc, sel);
                if text.is_empty() {
                    return Ok((Some(base.root().clone()), Selection::caret(caret)));
                }
                let (root, caret) = transform::insert_text(&base, caret, text)?;
                Ok((Some(root), Selection::caret(caret)))
            }

            Command::DeleteSelection => {
                if sel.is_caret() {
                    return Ok((None, sel));
                }
                let (base, caret) = delete_selection(doc, sel);
                Ok((Some(base.root().clone()), Selection::caret(caret)))
            }

            Command::ToggleMark(MarkType::Link) => Err(SchemaViolation::InvalidMark {
                mark: MarkType::Link,
                reason: "links need an href; use SetLink".to_string(),
            }
            .into()),

            Command::ToggleMark(mark_type) => {
                let Some(mark) = Mark::simple(*mark_type) else {
                    return Ok((None, sel));
                };
                if sel.is_caret() {
                    return Ok((None, sel));
                }
                let remove = transform::range_has_mark(doc, from, to, *mark_type);
                let root = transform::map_marks(doc, from, to, |marks| {
                    if remove {
                        marks.without(*mark_type)
                    } else {
                        marks.with(mark.clone())
                    }
                });
                Ok((changed(doc, root), sel))
            }

            Command::SetLink { href, label } => {
                let mark = Mark::link(href.clone(), label.clone());
                self.schema.validate_mark(&mark)?;
                let Some((lo, hi)) = link_target(doc, sel) else {
                    return Ok((None, sel));
                };
                let root = transform::map_marks(doc, lo, hi, |marks| marks.with(mark.clone()));
                Ok((changed(doc, root), sel))
            }

            Command::UnsetLink => {
                let Some((lo, hi)) = link_target(doc, sel) else {
                    return Ok((None, sel));
                };
                let root = transform::map_marks(doc, lo, hi, |marks| marks.without(MarkType::Link));
                Ok((changed(doc, root), sel))
            }

            Command::SetBlockType(block_type) => {
                let kind = block_type.node_kind();
                self.schema.validate_attrs(&kind)?;
                let root = transform::set_textblock_kind(doc, from, to, &kind);
                Ok((changed(doc, root), sel))
            }

            Command::ToggleList { ordered } => {
                let root = transform::toggle_list(doc, from, to, *ordered)?;
                let after = doc.successor(root.clone());
                let mapped = Selection::new(
                    transform::map_position(doc, &after, sel.anchor),
                    transform::map_position(doc, &after, sel.head),
                );
                Ok((changed(doc, root), mapped))
            }

            Command::InsertNode(node) => {
                self.schema.validate(node)?;
                let (base, caret) = delete_selection(doc, sel);
                let (root, caret) =
                    transform::insert_block(&base, caret, node.clone(), &self.schema)?;
                Ok((Some(root), Selection::caret(caret)))
            }

            Command::SetNodeAttrs { pos, kind } => {
                self.schema.validate_attrs(kind)?;
                let root = transform::set_node_kind(doc, *pos, kind.clone())?;
                Ok((changed(doc, root), sel))
            }

            Command::SetSelection(next) => {
                next.validate(doc)?;
                Ok((None, *next))
            }

            Command::SelectAll => Ok((None, Selection::all(doc))),

            Command::ExtendMarkRange(mark_type) => {
                if !sel.is_caret() {
                    return Ok((None, sel));
                }
                let next = resolve_mark_range(doc, sel.head, *mark_type)
                    .map(|r| Selection::range(r.from, r.to))
                    .unwrap_or(sel);
                Ok((None, next))
            }
        }
    }

    /// Serializes a document to stored markup.
    pub fn serialized_content(&self, doc: &Document) -> String {
        markup::serialize(doc)
    }

    /// Parses stored markup into a fresh document.
    pub fn set_content(&self, input: &str) -> ModelResult<Document> {
        Ok(markup::parse(input, &self.schema)?)
    }
}

/// Deletes the selected range, returning the document and the caret after it.
///
/// The caret lands where typing can continue, even when the range began
/// on a block edge.
fn delete_selection(doc: &Document, sel: Selection) -> (Document, usize) {
    if sel.is_caret() {
        return (doc.clone(), sel.head);
    }
    let after = doc.successor(transform::delete_range(doc, sel.from(), sel.to()));
    let caret = after.text_position_near(sel.from().min(after.size()));
    (after, caret)
}

/// The range a link command acts on: the selection, or the link around a caret.
fn link_target(doc: &Document, sel: Selection) -> Option<(usize, usize)> {
    if sel.is_caret() {
        resolve_mark_range(doc, sel.head, MarkType::Link).map(|r| (r.from, r.to))
    } else {
        Some((sel.from(), sel.to()))
    }
}

fn changed(doc: &Document, root: Node) -> Option<Node> {
    (root != *doc.root()).then_some(root)
}
