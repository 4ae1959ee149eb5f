//! Stored post markup.
//!
//! Documents are persisted as a small, canonical HTML subset. The
//! serializer always produces the same text for the same tree, and the
//! parser accepts everything the serializer writes plus a few common
//! variants (`<b>`, `<i>`, `<br>`, unquoted attributes, comments).

mod lexer;
mod parser;
mod serializer;

pub use parser::parse;
pub use serializer::serialize;

use crate::schema::SchemaViolation;

/// Stored markup could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    #[error("unknown tag <{name}> at byte {offset}")]
    UnknownTag { name: String, offset: usize },

    #[error("unterminated tag at byte {offset}")]
    Unterminated { offset: usize },

    #[error("unexpected </{found}> at byte {offset} (expected {expected})")]
    MismatchedClose {
        found: String,
        expected: String,
        offset: usize,
    },

    #[error("<{0}> was never closed")]
    Unclosed(String),

    #[error("<{tag}> is missing required attribute `{attr}`")]
    MissingAttribute { tag: String, attr: String },

    #[error("<{tag}> has an invalid `{attr}` attribute: {value}")]
    InvalidAttribute {
        tag: String,
        attr: String,
        value: String,
    },

    #[error("block <{tag}> at byte {offset} cannot appear inside inline content")]
    BlockInInline { tag: String, offset: usize },

    #[error("markup violates the schema: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Canonical embed URL for a video id.
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::node::{Mark, Node, TextRun};
    use crate::schema::Schema;

    fn round_trip(doc: &Document) -> Document {
        parse(&serialize(doc), &Schema::default()).unwrap()
    }

    #[test]
    fn test_link_with_nested_marks_round_trips() {
        let doc = Document::from_blocks(
            vec![Node::paragraph(vec![
                TextRun::plain("see "),
                TextRun::marked("the", [Mark::link("https://a.dev", Some("A".into()))]),
                TextRun::marked(
                    " docs",
                    [Mark::link("https://a.dev", Some("A".into())), Mark::Bold],
                ),
                TextRun::plain(" & more"),
            ])],
            &Schema::default(),
        )
        .unwrap();
        let html = serialize(&doc);
        assert_eq!(
            html,
            r#"<p>see <a href="https://a.dev" title="A">the<strong> docs</strong></a> &amp; more</p>"#
        );
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_every_block_round_trips() {
        let doc = Document::from_blocks(
            vec![
                Node::heading(2, vec![TextRun::plain("Title")]),
                Node::blockquote(vec![Node::paragraph(vec![TextRun::marked(
                    "quoted",
                    [Mark::Italic, Mark::Underline],
                )])]),
                Node::ordered_list(vec![Node::list_item(vec![
                    Node::paragraph(vec![TextRun::plain("one\ntwo")]),
                    Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![])])]),
                ])]),
                Node::image("/a \"b\".png", Some("alt & text".into())),
                Node::image("/plain.png", None),
                Node::video("dQw4w9WgXcQ"),
                Node::horizontal_rule(),
                Node::paragraph(vec![]),
            ],
            &Schema::default(),
        )
        .unwrap();
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_empty_document_round_trips() {
        assert_eq!(serialize(&Document::empty()), "<p></p>");
        assert_eq!(round_trip(&Document::empty()), Document::empty());
    }
}
