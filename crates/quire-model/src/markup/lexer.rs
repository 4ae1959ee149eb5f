//! Tokenizer for stored post markup.
//!
//! The lexer only finds tag boundaries; attributes are picked apart by
//! [`parse_open_tag`] once a tag is known to be well formed.

use logos::Logos;

/// Raw markup tokens.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"<!--([^-]|-[^-])*-->")]
pub enum Token<'src> {
    /// `<name attr="value" ...>` or `<name ... />`
    #[regex(
        r#"<[a-zA-Z][a-zA-Z0-9]*([ \t\r\n]+[a-zA-Z_:][-a-zA-Z0-9_:.]*([ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'|[^ \t\r\n"'=<>`/]+))?)*[ \t\r\n]*/?>"#,
        |lex| lex.slice()
    )]
    OpenTag(&'src str),

    /// `</name>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>", close_name)]
    CloseTag(&'src str),

    /// Character data between tags, still entity-encoded.
    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

fn close_name<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> &'src str {
    lex.slice()[2..].trim_end_matches('>').trim_end()
}

/// An opening tag split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order, names lowercased, values still encoded.
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl OpenTag {
    /// Returns the raw value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the attribute is present, with or without a value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }
}

/// Splits a lexed opening tag into name and attributes.
pub fn parse_open_tag(raw: &str) -> OpenTag {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    let mut rest = inner[name_end..].trim_start();
    let mut attrs = Vec::new();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    (&body[..end], body.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remaining.trim_start();
            value.to_string()
        } else {
            String::new()
        };
        attrs.push((key, value));
    }

    OpenTag {
        name,
        attrs,
        self_closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Token::lexer(input).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_tag_boundaries() {
        assert_eq!(
            tokens(r#"<p>a &amp; b</p><img src="/x.png">"#),
            vec![
                Token::OpenTag("<p>"),
                Token::Text("a &amp; b"),
                Token::CloseTag("p"),
                Token::OpenTag(r#"<img src="/x.png">"#),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("<p>a<!-- note -->b</p>"),
            vec![
                Token::OpenTag("<p>"),
                Token::Text("a"),
                Token::Text("b"),
                Token::CloseTag("p"),
            ]
        );
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        assert!(Token::lexer("<p").any(|t| t.is_err()));
    }

    #[test]
    fn test_parse_open_tag_attributes() {
        let tag = parse_open_tag(
            r#"<IFRAME src="https://www.youtube.com/embed/abc" data-video-id='abc' allowfullscreen>"#,
        );
        assert_eq!(tag.name, "iframe");
        assert_eq!(tag.attr("src"), Some("https://www.youtube.com/embed/abc"));
        assert_eq!(tag.attr("data-video-id"), Some("abc"));
        assert!(tag.has_attr("allowfullscreen"));
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_self_closing() {
        let tag = parse_open_tag("<hr/>");
        assert_eq!(tag.name, "hr");
        assert!(tag.self_closing);
        assert!(tag.attrs.is_empty());
    }
}
