//! Markup to document.
//!
//! A single pass over the token stream with an explicit stack of open
//! block containers. At most one textblock is open at a time; inline
//! content found directly at block level opens an implicit paragraph
//! that closes itself at the next block boundary.

use html_escape::decode_html_entities;
use logos::Logos;

use crate::document::Document;
use crate::node::{Content, Mark, MarkSet, Node, NodeKind, TextRun};
use crate::schema::Schema;

use super::SerializationError;
use super::lexer::{OpenTag, Token, parse_open_tag};

const EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

/// Parses markup into a validated document.
///
/// Empty (or whitespace-only) input yields [`Document::empty`].
pub fn parse(input: &str, schema: &Schema) -> Result<Document, SerializationError> {
    let mut parser = Parser::new();
    for (token, span) in Token::lexer(input).spanned() {
        let token = token.map_err(|_| SerializationError::Unterminated { offset: span.start })?;
        parser.feed(token, span.start)?;
    }
    let blocks = parser.finish()?;
    if blocks.is_empty() {
        return Ok(Document::empty());
    }
    let root = Node::doc(blocks);
    schema.validate(&root)?;
    Ok(Document::from_root(root))
}

struct Frame {
    tag: String,
    kind: NodeKind,
    children: Vec<Node>,
}

struct Textblock {
    /// `None` for an implicit paragraph.
    tag: Option<String>,
    kind: NodeKind,
    runs: Vec<TextRun>,
}

struct Parser {
    frames: Vec<Frame>,
    textblock: Option<Textblock>,
    marks: Vec<(String, Mark)>,
    /// Set after an `<iframe>` whose `</iframe>` has not been seen yet.
    awaiting_iframe_close: bool,
}

impl Parser {
    fn new() -> Self {
        Self {
            frames: vec![Frame {
                tag: String::new(),
                kind: NodeKind::Doc,
                children: Vec::new(),
            }],
            textblock: None,
            marks: Vec::new(),
            awaiting_iframe_close: false,
        }
    }

    fn feed(&mut self, token: Token<'_>, offset: usize) -> Result<(), SerializationError> {
        if self.awaiting_iframe_close {
            self.awaiting_iframe_close = false;
            return match token {
                Token::CloseTag(name) if name.eq_ignore_ascii_case("iframe") => Ok(()),
                _ => Err(SerializationError::Unclosed("iframe".into())),
            };
        }
        match token {
            Token::Text(raw) => self.text(raw),
            Token::OpenTag(raw) => self.open(parse_open_tag(raw), offset),
            Token::CloseTag(name) => self.close(&name.to_ascii_lowercase(), offset),
        }
    }

    fn finish(mut self) -> Result<Vec<Node>, SerializationError> {
        if self.awaiting_iframe_close {
            return Err(SerializationError::Unclosed("iframe".into()));
        }
        if let Some((tag, _)) = self.marks.last() {
            return Err(SerializationError::Unclosed(tag.clone()));
        }
        if let Some(Textblock { tag: Some(tag), .. }) = &self.textblock {
            return Err(SerializationError::Unclosed(tag.clone()));
        }
        self.close_implicit();
        if self.frames.len() > 1 {
            let tag = self.frames.last().map(|f| f.tag.clone()).unwrap_or_default();
            return Err(SerializationError::Unclosed(tag));
        }
        Ok(self.frames.pop().map(|f| f.children).unwrap_or_default())
    }

    // ==================== Tokens ====================

    fn text(&mut self, raw: &str) -> Result<(), SerializationError> {
        if self.textblock.is_none() && raw.trim().is_empty() {
            return Ok(());
        }
        let text = decode_html_entities(raw).into_owned();
        self.push_text(text);
        Ok(())
    }

    fn open(&mut self, tag: OpenTag, offset: usize) -> Result<(), SerializationError> {
        let name = tag.name.clone();
        match name.as_str() {
            "p" => self.open_textblock(tag.name, NodeKind::Paragraph, offset),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.name[1..].parse().unwrap_or(1);
                self.open_textblock(tag.name, NodeKind::Heading { level }, offset)
            }
            "blockquote" => self.open_frame(tag.name, NodeKind::Blockquote, offset),
            "ul" => self.open_frame(tag.name, NodeKind::BulletList, offset),
            "ol" => self.open_frame(tag.name, NodeKind::OrderedList, offset),
            "li" => self.open_frame(tag.name, NodeKind::ListItem, offset),
            "hr" => self.push_leaf(Node::horizontal_rule(), &tag.name, offset),
            "img" => {
                let src = required_attr(&tag, "src")?;
                let alt = tag.attr("alt").map(decode);
                self.push_leaf(Node::image(src, alt), &tag.name, offset)
            }
            "iframe" => {
                let video_id = video_id(&tag)?;
                self.push_leaf(Node::video(video_id), &tag.name, offset)?;
                self.awaiting_iframe_close = !tag.self_closing;
                Ok(())
            }
            "br" => {
                self.push_text("\n".into());
                Ok(())
            }
            "a" => {
                let href = required_attr(&tag, "href")?;
                let label = tag.attr("title").map(decode);
                self.open_mark(tag.name, Mark::link(href, label))
            }
            "strong" | "b" => self.open_mark(tag.name, Mark::Bold),
            "em" | "i" => self.open_mark(tag.name, Mark::Italic),
            "u" => self.open_mark(tag.name, Mark::Underline),
            _ => Err(SerializationError::UnknownTag {
                name: tag.name,
                offset,
            }),
        }
    }

    fn close(&mut self, name: &str, offset: usize) -> Result<(), SerializationError> {
        match name {
            "a" | "strong" | "b" | "em" | "i" | "u" => match self.marks.pop() {
                Some((tag, _)) if tag == name => Ok(()),
                Some((tag, _)) => Err(mismatch(name, &tag, offset)),
                None => Err(mismatch(name, "nothing", offset)),
            },
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if let Some((tag, _)) = self.marks.last() {
                    return Err(mismatch(name, tag, offset));
                }
                match self.textblock.take() {
                    Some(Textblock {
                        tag: Some(tag),
                        kind,
                        runs,
                    }) if tag == name => {
                        self.push_child(Node::new(kind, Content::Inline(runs)));
                        Ok(())
                    }
                    Some(open) => {
                        let expected = open.tag.clone().unwrap_or_else(|| "p".into());
                        Err(mismatch(name, &expected, offset))
                    }
                    None => Err(mismatch(name, &self.expected_close(), offset)),
                }
            }
            "blockquote" | "ul" | "ol" | "li" => {
                if let Some((tag, _)) = self.marks.last() {
                    return Err(mismatch(name, tag, offset));
                }
                if let Some(Textblock { tag: Some(tag), .. }) = &self.textblock {
                    return Err(mismatch(name, tag, offset));
                }
                self.close_implicit();
                if self.frames.len() < 2 || self.frames.last().is_none_or(|f| f.tag != name) {
                    return Err(mismatch(name, &self.expected_close(), offset));
                }
                if let Some(frame) = self.frames.pop() {
                    self.push_child(Node::new(
                        frame.kind,
                        Content::Blocks(frame.children),
                    ));
                }
                Ok(())
            }
            "img" | "hr" | "br" | "iframe" => Err(mismatch(name, &self.expected_close(), offset)),
            _ => Err(SerializationError::UnknownTag {
                name: name.to_string(),
                offset,
            }),
        }
    }

    // ==================== State ====================

    fn open_textblock(
        &mut self,
        tag: String,
        kind: NodeKind,
        offset: usize,
    ) -> Result<(), SerializationError> {
        self.leave_inline(&tag, offset)?;
        self.textblock = Some(Textblock {
            tag: Some(tag),
            kind,
            runs: Vec::new(),
        });
        Ok(())
    }

    fn open_frame(
        &mut self,
        tag: String,
        kind: NodeKind,
        offset: usize,
    ) -> Result<(), SerializationError> {
        self.leave_inline(&tag, offset)?;
        self.frames.push(Frame {
            tag,
            kind,
            children: Vec::new(),
        });
        Ok(())
    }

    fn push_leaf(&mut self, node: Node, tag: &str, offset: usize) -> Result<(), SerializationError> {
        self.leave_inline(tag, offset)?;
        self.push_child(node);
        Ok(())
    }

    fn open_mark(&mut self, tag: String, mark: Mark) -> Result<(), SerializationError> {
        self.ensure_textblock();
        self.marks.push((tag, mark));
        Ok(())
    }

    /// Closes an implicit paragraph before block content; explicit inline
    /// content cannot hold blocks.
    fn leave_inline(&mut self, tag: &str, offset: usize) -> Result<(), SerializationError> {
        let explicit = matches!(&self.textblock, Some(Textblock { tag: Some(_), .. }));
        if explicit || !self.marks.is_empty() {
            return Err(SerializationError::BlockInInline {
                tag: tag.to_string(),
                offset,
            });
        }
        self.close_implicit();
        Ok(())
    }

    fn close_implicit(&mut self) {
        if let Some(Textblock { tag: None, .. }) = &self.textblock {
            if let Some(block) = self.textblock.take() {
                self.push_child(Node::new(block.kind, Content::Inline(block.runs)));
            }
        }
    }

    fn ensure_textblock(&mut self) {
        if self.textblock.is_none() {
            self.textblock = Some(Textblock {
                tag: None,
                kind: NodeKind::Paragraph,
                runs: Vec::new(),
            });
        }
    }

    fn push_text(&mut self, text: String) {
        let marks: MarkSet = self.marks.iter().map(|(_, m)| m.clone()).collect();
        self.ensure_textblock();
        if let Some(block) = self.textblock.as_mut() {
            block.runs.push(TextRun::new(text, marks));
        }
    }

    fn push_child(&mut self, node: Node) {
        if let Some(frame) = self.frames.last_mut() {
            frame.children.push(node);
        }
    }

    fn expected_close(&self) -> String {
        match &self.textblock {
            Some(Textblock { tag: Some(tag), .. }) => tag.clone(),
            _ => self
                .frames
                .last()
                .filter(|f| !f.tag.is_empty())
                .map(|f| f.tag.clone())
                .unwrap_or_else(|| "nothing".into()),
        }
    }
}

fn mismatch(found: &str, expected: &str, offset: usize) -> SerializationError {
    SerializationError::MismatchedClose {
        found: found.to_string(),
        expected: expected.to_string(),
        offset,
    }
}

fn decode(raw: &str) -> String {
    decode_html_entities(raw).into_owned()
}

fn required_attr(tag: &OpenTag, attr: &str) -> Result<String, SerializationError> {
    tag.attr(attr)
        .map(decode)
        .ok_or_else(|| SerializationError::MissingAttribute {
            tag: tag.name.clone(),
            attr: attr.to_string(),
        })
}

/// Reads the video id of an embed, preferring `data-video-id` over `src`.
fn video_id(tag: &OpenTag) -> Result<String, SerializationError> {
    if let Some(id) = tag.attr("data-video-id") {
        return Ok(decode(id));
    }
    let src = required_attr(tag, "src")?;
    src.strip_prefix(EMBED_PREFIX)
        .map(|rest| rest.split(['?', '#', '/']).next().unwrap_or_default().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(SerializationError::InvalidAttribute {
            tag: tag.name.clone(),
            attr: "src".into(),
            value: src.clone(),
        })
}
