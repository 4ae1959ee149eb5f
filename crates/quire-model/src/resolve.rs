//! Mark range resolution.
//!
//! Given a position, find the span a mark covers around it. This is what
//! turns "the user clicked inside a link" into "re-select `3..7` and
//! open the link editor". Everything here is a pure read of the document.

use crate::document::Document;
use crate::inline;
use crate::node::{Mark, MarkSet};
use crate::schema::MarkType;
use crate::selection::{MarkRange, Selection};

/// Returns the maximal range around `pos` carrying one `mark_type` mark.
///
/// Both ends are exclusive: a position sitting exactly on the edge of a
/// mark is not inside it, so `None` comes back. The characters on both
/// sides of `pos` must carry the same mark (same attributes), and the
/// range grows outward while neighbouring text carries that same mark.
pub fn resolve_mark_range(doc: &Document, pos: usize, mark_type: MarkType) -> Option<MarkRange> {
    let block = doc.textblock_at(pos)?;
    let runs = block.node.runs();
    let offset = pos - block.content_start;
    if offset == 0 || offset >= inline::len(runs) {
        return None;
    }

    let before = inline::mark_at(runs, offset - 1, mark_type)?;
    let after = inline::mark_at(runs, offset, mark_type)?;
    if before != after {
        return None;
    }

    let (left_run, _) = inline::run_index_at(runs, offset - 1)?;
    let (right_run, _) = inline::run_index_at(runs, offset)?;

    let mut first = left_run;
    while first > 0 && runs[first - 1].marks.get(mark_type) == Some(before) {
        first -= 1;
    }
    let mut last = right_run;
    while last + 1 < runs.len() && runs[last + 1].marks.get(mark_type) == Some(before) {
        last += 1;
    }

    let from: usize = runs[..first].iter().map(|r| r.len()).sum();
    let to: usize = runs[..=last].iter().map(|r| r.len()).sum();
    Some(MarkRange::new(
        block.content_start + from,
        block.content_start + to,
    ))
}

/// Returns the mark of `mark_type` covering `pos`, with its range.
pub fn mark_around(doc: &Document, pos: usize, mark_type: MarkType) -> Option<(Mark, MarkRange)> {
    let range = resolve_mark_range(doc, pos, mark_type)?;
    let block = doc.textblock_at(pos)?;
    let mark = inline::mark_at(block.node.runs(), pos - block.content_start, mark_type)?;
    Some((mark.clone(), range))
}

/// Returns the marks active for a selection.
///
/// For a range, the marks shared by every selected character. For a
/// caret, the marks of the character before it (or after it at the
/// start of a block).
pub fn active_marks(doc: &Document, selection: &Selection) -> MarkSet {
    if selection.is_caret() {
        let pos = selection.head;
        let Some(block) = doc.textblock_at(pos) else {
            return MarkSet::new();
        };
        let runs = block.node.runs();
        let offset = pos - block.content_start;
        let at = if offset > 0 { offset - 1 } else { offset };
        return inline::marks_at(runs, at).cloned().unwrap_or_default();
    }

    let (from, to) = (selection.from(), selection.to());
    let mut shared: Option<MarkSet> = None;
    for block in doc.textblocks_between(from, to) {
        let lo = from.max(block.content_start) - block.content_start;
        let hi = to.min(block.content_end()) - block.content_start;
        for run in inline::slice(block.node.runs(), lo, hi) {
            shared = Some(match shared {
                None => run.marks.clone(),
                Some(acc) => acc.intersect(&run.marks),
            });
        }
    }
    shared.unwrap_or_default()
}
