//! Parser for `${ TOKEN }$` placeholders in shader template sources.
//!
//! A template is split into literal text and token references. Whitespace
//! between the delimiters and the token name is ignored. Token names must be
//! identifiers (`[A-Za-z_][A-Za-z0-9_]*`); anything else, an opening delimiter
//! with no close, or a stray closing delimiter is reported as a
//! [`TemplateError`].

/// Opening placeholder delimiter.
pub const OPEN: &str = "${";
/// Closing placeholder delimiter.
pub const CLOSE: &str = "}$";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("`${{` at byte {offset} is never closed")]
    Unterminated { offset: usize },

    #[error("`}}$` at byte {offset} has no matching `${{`")]
    UnmatchedClose { offset: usize },

    #[error("empty token at byte {offset}")]
    EmptyToken { offset: usize },

    #[error("`{token}` at byte {offset} is not a valid token name")]
    InvalidToken { offset: usize, token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Token(&'a str),
}

/// A parsed template borrowing from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    pub fn parse(source: &'a str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        loop {
            let tail = &source[cursor..];

            let Some(open) = tail.find(OPEN) else {
                if let Some(close) = tail.find(CLOSE) {
                    return Err(TemplateError::UnmatchedClose {
                        offset: cursor + close,
                    });
                }
                if !tail.is_empty() {
                    segments.push(Segment::Text(tail));
                }
                break;
            };

            if let Some(close) = tail[..open].find(CLOSE) {
                return Err(TemplateError::UnmatchedClose {
                    offset: cursor + close,
                });
            }
            if open > 0 {
                segments.push(Segment::Text(&tail[..open]));
            }

            let offset = cursor + open;
            let body_start = offset + OPEN.len();
            let Some(body_len) = source[body_start..].find(CLOSE) else {
                return Err(TemplateError::Unterminated { offset });
            };

            let name = source[body_start..body_start + body_len].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyToken { offset });
            }
            if !is_identifier(name) {
                return Err(TemplateError::InvalidToken {
                    offset,
                    token: name.to_string(),
                });
            }
            segments.push(Segment::Token(name));

            cursor = body_start + body_len + CLOSE.len();
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Distinct token names, in order of first appearance.
    pub fn tokens(&self) -> Vec<&'a str> {
        let mut tokens: Vec<&'a str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Token(name) = segment {
                if !tokens.contains(name) {
                    tokens.push(name);
                }
            }
        }
        tokens
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `text` still contains placeholder delimiters.
pub fn contains_placeholder(text: &str) -> bool {
    text.contains(OPEN) || text.contains(CLOSE)
}
