//! Line tokenizer.
//!
//! A single left-to-right scan over one line of source. Every character ends
//! up in exactly one token, so concatenating the token texts gives back the
//! line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Number,
    Literal,
    Operator,
    Paren,
    Bracket,
    Definition,
    Comment,
    Whitespace,
    Unknown,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Literal => "literal",
            Self::Operator => "operator",
            Self::Paren => "paren",
            Self::Bracket => "bracket",
            Self::Definition => "definition",
            Self::Comment => "comment",
            Self::Whitespace => "whitespace",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the token carries meaning for the parser.
    pub fn is_semantic(&self) -> bool {
        !matches!(self, Self::Comment | Self::Whitespace)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// How the tokenizer treats characters outside the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizeMode {
    /// Reject the line
    #[default]
    Strict,
    /// Emit an `unknown` token per character, used for highlighting
    Permissive,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Unknown character '{character}' at column {column}")]
pub struct TokenizeError {
    pub character: char,
    /// 1-based, counted in characters
    pub column: usize,
}

const OPERATORS: &str = "+-*/^";

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | ',' | '%')
}

fn is_literal_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_literal_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Consume characters while `accept` holds; returns the end byte offset.
fn take_while(
    chars: &mut Peekable<CharIndices<'_>>,
    column: &mut usize,
    line_end: usize,
    accept: impl Fn(char) -> bool,
) -> usize {
    while let Some(&(_, c)) = chars.peek() {
        if !accept(c) {
            break;
        }
        chars.next();
        *column += 1;
    }
    chars.peek().map_or(line_end, |&(offset, _)| offset)
}

/// Split one line into tokens.
///
/// # Panics
/// If `line` contains a newline; split the source into lines first.
pub fn tokenize(line: &str, mode: TokenizeMode) -> Result<Vec<Token>, TokenizeError> {
    assert!(!line.contains('\n'), "tokenizer expects a single line");

    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();
    let mut column = 0;

    while let Some(&(start, c)) = chars.peek() {
        if c == '#' {
            tokens.push(Token::new(TokenKind::Comment, &line[start..]));
            break;
        }

        if c == ' ' || c == '\t' {
            let end = take_while(&mut chars, &mut column, line.len(), |c| c == ' ' || c == '\t');
            tokens.push(Token::new(TokenKind::Whitespace, &line[start..end]));
            continue;
        }

        if c.is_ascii_digit() {
            let end = take_while(&mut chars, &mut column, line.len(), is_number_char);
            tokens.push(Token::new(TokenKind::Number, &line[start..end]));
            continue;
        }

        if is_literal_start(c) {
            let end = take_while(&mut chars, &mut column, line.len(), is_literal_char);
            tokens.push(Token::new(TokenKind::Literal, &line[start..end]));
            continue;
        }

        chars.next();
        column += 1;

        let kind = match c {
            '(' | ')' => TokenKind::Paren,
            '[' | ']' => TokenKind::Bracket,
            ':' => TokenKind::Definition,
            c if OPERATORS.contains(c) => TokenKind::Operator,
            _ => match mode {
                TokenizeMode::Permissive => TokenKind::Unknown,
                TokenizeMode::Strict => {
                    return Err(TokenizeError {
                        character: c,
                        column,
                    })
                }
            },
        };
        tokens.push(Token::new(kind, c.to_string()));
    }

    Ok(tokens)
}
