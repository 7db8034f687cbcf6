//! Syntax highlighting.
//!
//! Works on permissively tokenized source, so any text can be highlighted,
//! including lines that would not compile.

use super::parser::{Constant, Function};
use super::token::{Token, TokenKind, TokenizeMode};
use super::types::Document;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightClass {
    Operator,
    Number,
    Paren,
    Bracket,
    Definition,
    Comment,
    Whitespace,
    Unknown,
    Function,
    Constant,
    Literal,
}

impl HighlightClass {
    /// Class of a token; literals are split into functions, constants and
    /// other names.
    pub fn of(token: &Token) -> Self {
        match token.kind {
            TokenKind::Operator => Self::Operator,
            TokenKind::Number => Self::Number,
            TokenKind::Paren => Self::Paren,
            TokenKind::Bracket => Self::Bracket,
            TokenKind::Definition => Self::Definition,
            TokenKind::Comment => Self::Comment,
            TokenKind::Whitespace => Self::Whitespace,
            TokenKind::Unknown => Self::Unknown,
            TokenKind::Literal if Function::from_name(&token.text).is_some() => Self::Function,
            TokenKind::Literal if Constant::from_name(&token.text).is_some() => Self::Constant,
            TokenKind::Literal => Self::Literal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Number => "number",
            Self::Paren => "paren",
            Self::Bracket => "bracket",
            Self::Definition => "definition",
            Self::Comment => "comment",
            Self::Whitespace => "whitespace",
            Self::Unknown => "unknown",
            Self::Function => "function",
            Self::Constant => "constant",
            Self::Literal => "literal",
        }
    }
}

impl fmt::Display for HighlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedToken {
    pub text: String,
    pub class: HighlightClass,
    /// Inside a unit bracket, brackets included
    pub in_unit: bool,
}

impl HighlightedToken {
    pub fn css_class(&self) -> String {
        let suffix = if self.in_unit { "-unit" } else { "" };
        format!("calc-token-{}{}", self.class, suffix)
    }
}

/// Classify the raw tokens of one line.
pub fn highlight_line(tokens: &[Token]) -> Vec<HighlightedToken> {
    let mut in_unit = false;

    tokens
        .iter()
        .map(|token| {
            if token.is(TokenKind::Bracket, "[") {
                in_unit = true;
            }

            let highlighted = HighlightedToken {
                text: token.text.clone(),
                class: HighlightClass::of(token),
                in_unit,
            };

            if token.is(TokenKind::Bracket, "]") {
                in_unit = false;
            }
            highlighted
        })
        .collect()
}

/// Highlighted tokens of every line of `source`.
pub fn highlight(source: &str) -> Vec<Vec<HighlightedToken>> {
    Document::split_lines(source, TokenizeMode::Permissive)
        .lines
        .iter()
        .map(|line| highlight_line(&line.raw_tokens))
        .collect()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render `source` as HTML: one `span` per token, lines joined by `<br/>`.
pub fn render_html(source: &str) -> String {
    highlight(source)
        .iter()
        .map(|line| {
            line.iter()
                .map(|token| {
                    format!(
                        r#"<span class="{}">{}</span>"#,
                        token.css_class(),
                        escape_html(&token.text)
                    )
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("<br/>")
}
