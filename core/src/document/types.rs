//! Core types for a calculator document.

use super::evaluator::EvalError;
use super::parser::{Ast, ParseError};
use super::token::{tokenize, Token, TokenizeError, TokenizeMode};
use crate::units::{CompositeUnit, UnitCatalog};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single line could not produce a value. The rest of the document
/// is still evaluated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LineError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Errors that reject a whole document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Line numbers in the message are 1-based.
    #[error("Cyclic definitions detected: line {} depends on line {}", .line + 1, .depends_on + 1)]
    CyclicDependency { line: usize, depends_on: usize },
}

/// One line of source, compiled.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Variable name, if the line starts with `name:`
    pub name: Option<String>,
    /// Semantic tokens, without whitespace, comments or the declaration
    pub tokens: Vec<Token>,
    /// Every token of the line, for highlighting
    pub raw_tokens: Vec<Token>,
    /// Indices of the lines this one references
    pub dependencies: Vec<usize>,
    pub ast: Option<Ast>,
    pub value: f64,
    pub unit: CompositeUnit,
    pub error: Option<LineError>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn outcome(&self) -> LineOutcome {
        if let Some(err) = &self.error {
            LineOutcome::Error {
                message: err.to_string(),
            }
        } else if self.is_empty() {
            LineOutcome::Empty
        } else {
            LineOutcome::Value {
                value: self.value,
                unit: self.unit.to_string(),
            }
        }
    }
}

/// What a line evaluated to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineOutcome {
    Error { message: String },
    Empty,
    Value { value: f64, unit: String },
}

impl fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { message } => write!(f, "Error: {}", message),
            Self::Empty => Ok(()),
            Self::Value { value, unit } if unit.is_empty() => {
                f.write_str(&format_number(*value))
            }
            Self::Value { value, unit } => write!(f, "{} {}", format_number(*value), unit),
        }
    }
}

/// Render a value rounded to 13 decimals, without trailing zeros.
pub fn format_number(value: f64) -> String {
    let mut text = format!("{:.13}", value);

    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }

    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// A compiled document: its lines, the variables they declare and the order
/// they must be evaluated in.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub lines: Vec<Line>,
    /// Variable name -> index of the line declaring it (last declaration wins)
    pub variables: HashMap<String, usize>,
    /// Line indices, every line after the lines it depends on
    pub execution_order: Vec<usize>,
    pub source: String,
}

impl Document {
    /// Tokenize every line of `source`. Lines the tokenizer rejects carry the
    /// error and no tokens.
    pub fn split_lines(source: &str, mode: TokenizeMode) -> Self {
        let lines = source
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                match tokenize(line, mode) {
                    Ok(raw_tokens) => Line {
                        tokens: raw_tokens
                            .iter()
                            .filter(|t| t.kind.is_semantic())
                            .cloned()
                            .collect(),
                        raw_tokens,
                        ..Line::default()
                    },
                    Err(err) => Line {
                        error: Some(err.into()),
                        ..Line::default()
                    },
                }
            })
            .collect();

        Self {
            lines,
            source: source.to_string(),
            ..Self::default()
        }
    }

    /// Compile a document: tokenize, resolve declarations and dependencies,
    /// schedule, then parse every line.
    ///
    /// A reference cycle rejects the whole document before anything is parsed.
    pub fn parse(source: &str, catalog: &UnitCatalog) -> Result<Self, DocumentError> {
        let mut document = Self::split_lines(source, TokenizeMode::Strict);

        document.resolve_declarations();
        document.build_dependencies();

        if let Some((line, depends_on)) = document.find_cycle() {
            warn!(line, depends_on, "document rejected: cyclic definitions");
            return Err(DocumentError::CyclicDependency { line, depends_on });
        }

        document.schedule();
        document.parse_lines(catalog);

        debug!(
            lines = document.lines.len(),
            variables = document.variables.len(),
            errors = document.lines.iter().filter(|l| l.has_error()).count(),
            "document compiled"
        );
        Ok(document)
    }

    pub fn line_by_name(&self, name: &str) -> Option<&Line> {
        self.variables.get(name).map(|&index| &self.lines[index])
    }

    pub fn outcomes(&self) -> Vec<LineOutcome> {
        self.lines.iter().map(Line::outcome).collect()
    }

    /// The rendered outcome of every line, one per line.
    pub fn execution_result(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.outcome().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
