//! Operations on inline content (lists of text runs).
//!
//! Offsets here are character offsets inside one textblock, not document
//! positions. Every function returns normalised runs.

use crate::node::{Mark, MarkSet, TextRun};
use crate::schema::MarkType;

/// Drops empty runs and merges neighbours with equal marks.
pub fn normalize(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut out: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    out
}

/// Total length in characters.
pub fn len(runs: &[TextRun]) -> usize {
    runs.iter().map(TextRun::len).sum()
}

/// Byte index of the `n`th character of `text` (or `text.len()` past the end).
fn byte_index(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Splits the runs at a character offset.
pub fn split(runs: &[TextRun], at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut pos = 0;
    for run in runs {
        let len = run.len();
        if pos + len <= at {
            head.push(run.clone());
        } else if pos >= at {
            tail.push(run.clone());
        } else {
            let cut = byte_index(&run.text, at - pos);
            head.push(TextRun::new(&run.text[..cut], run.marks.clone()));
            tail.push(TextRun::new(&run.text[cut..], run.marks.clone()));
        }
        pos += len;
    }
    (normalize(head), normalize(tail))
}

/// Returns the runs between two offsets.
pub fn slice(runs: &[TextRun], from: usize, to: usize) -> Vec<TextRun> {
    let (_, rest) = split(runs, from);
    let (middle, _) = split(&rest, to.saturating_sub(from));
    middle
}

/// Removes the characters between two offsets.
pub fn delete(runs: &[TextRun], from: usize, to: usize) -> Vec<TextRun> {
    let (mut head, rest) = split(runs, from);
    let (_, tail) = split(&rest, to.saturating_sub(from));
    head.extend(tail);
    normalize(head)
}

/// Inserts runs at an offset.
pub fn insert(runs: &[TextRun], at: usize, inserted: Vec<TextRun>) -> Vec<TextRun> {
    let (mut head, tail) = split(runs, at);
    head.extend(inserted);
    head.extend(tail);
    normalize(head)
}

/// Concatenates two run lists.
pub fn concat(mut left: Vec<TextRun>, right: Vec<TextRun>) -> Vec<TextRun> {
    left.extend(right);
    normalize(left)
}

/// Rewrites the marks of every character between two offsets.
pub fn map_marks(
    runs: &[TextRun],
    from: usize,
    to: usize,
    f: impl Fn(&MarkSet) -> MarkSet,
) -> Vec<TextRun> {
    let (mut head, rest) = split(runs, from);
    let (middle, tail) = split(&rest, to.saturating_sub(from));
    head.extend(
        middle
            .into_iter()
            .map(|run| TextRun::new(run.text, f(&run.marks))),
    );
    head.extend(tail);
    normalize(head)
}

/// Returns the marks on the character at `offset`.
pub fn marks_at(runs: &[TextRun], offset: usize) -> Option<&MarkSet> {
    run_index_at(runs, offset).map(|(i, _)| &runs[i].marks)
}

/// Returns the mark of a type on the character at `offset`.
pub fn mark_at(runs: &[TextRun], offset: usize, mark_type: MarkType) -> Option<&Mark> {
    marks_at(runs, offset).and_then(|marks| marks.get(mark_type))
}

/// Finds the run containing the character at `offset` and that run's start offset.
pub fn run_index_at(runs: &[TextRun], offset: usize) -> Option<(usize, usize)> {
    let mut pos = 0;
    for (i, run) in runs.iter().enumerate() {
        let len = run.len();
        if offset < pos + len {
            return Some((i, pos));
        }
        pos += len;
    }
    None
}

/// Returns true if every character between the offsets carries a mark of `mark_type`.
pub fn all_have(runs: &[TextRun], from: usize, to: usize, mark_type: MarkType) -> bool {
    slice(runs, from, to)
        .iter()
        .all(|run| run.marks.has(mark_type))
}
