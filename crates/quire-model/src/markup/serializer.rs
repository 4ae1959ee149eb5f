//! Document to markup.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::document::Document;
use crate::node::{Mark, Node, NodeKind, TextRun};

use super::youtube_embed_url;

/// Serializes a document to canonical markup.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, node: &Node) {
    match node.kind() {
        NodeKind::Doc => node.children().iter().for_each(|c| write_block(out, c)),
        NodeKind::Paragraph => write_textblock(out, "p", node.runs()),
        NodeKind::Heading { level } => write_textblock(out, &format!("h{level}"), node.runs()),
        NodeKind::Blockquote => write_container(out, "blockquote", node),
        NodeKind::BulletList => write_container(out, "ul", node),
        NodeKind::OrderedList => write_container(out, "ol", node),
        NodeKind::ListItem => write_container(out, "li", node),
        NodeKind::Image { src, alt } => {
            out.push_str("<img src=\"");
            out.push_str(&encode_double_quoted_attribute(src));
            out.push('"');
            if let Some(alt) = alt {
                out.push_str(" alt=\"");
                out.push_str(&encode_double_quoted_attribute(alt));
                out.push('"');
            }
            out.push('>');
        }
        NodeKind::Video { video_id } => {
            let id = encode_double_quoted_attribute(video_id);
            out.push_str(&format!(
                "<iframe src=\"{}\" data-video-id=\"{id}\" allowfullscreen></iframe>",
                encode_double_quoted_attribute(&youtube_embed_url(video_id)),
            ));
        }
        NodeKind::HorizontalRule => out.push_str("<hr>"),
    }
}

fn write_container(out: &mut String, tag: &str, node: &Node) {
    out.push_str(&format!("<{tag}>"));
    for child in node.children() {
        write_block(out, child);
    }
    out.push_str(&format!("</{tag}>"));
}

fn write_textblock(out: &mut String, tag: &str, runs: &[TextRun]) {
    out.push_str(&format!("<{tag}>"));
    write_inline(out, runs);
    out.push_str(&format!("</{tag}>"));
}

/// Writes runs, keeping marks open across neighbours that share them.
///
/// Marks are nested in canonical order, so a run only closes the marks
/// past the longest prefix it shares with what is already open.
fn write_inline(out: &mut String, runs: &[TextRun]) {
    let mut open: Vec<&Mark> = Vec::new();
    for run in runs {
        let wanted: Vec<&Mark> = run.marks.iter().collect();
        let shared = open
            .iter()
            .zip(&wanted)
            .take_while(|(a, b)| a == b)
            .count();
        while open.len() > shared {
            if let Some(mark) = open.pop() {
                close_mark(out, mark);
            }
        }
        for mark in &wanted[shared..] {
            open_mark(out, mark);
            open.push(mark);
        }
        write_text(out, &run.text);
    }
    while let Some(mark) = open.pop() {
        close_mark(out, mark);
    }
}

fn write_text(out: &mut String, text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(&encode_text(first));
    }
    for line in lines {
        out.push_str("<br>");
        out.push_str(&encode_text(line));
    }
}

fn open_mark(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Link { href, label } => {
            out.push_str("<a href=\"");
            out.push_str(&encode_double_quoted_attribute(href));
            out.push('"');
            if let Some(label) = label {
                out.push_str(" title=\"");
                out.push_str(&encode_double_quoted_attribute(label));
                out.push('"');
            }
            out.push('>');
        }
        Mark::Bold => out.push_str("<strong>"),
        Mark::Italic => out.push_str("<em>"),
        Mark::Underline => out.push_str("<u>"),
    }
}

fn close_mark(out: &mut String, mark: &Mark) {
    out.push_str(match mark {
        Mark::Link { .. } => "</a>",
        Mark::Bold => "</strong>",
        Mark::Italic => "</em>",
        Mark::Underline => "</u>",
    });
}
