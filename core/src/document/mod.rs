//! Calculator documents.
//!
//! A document is a block of text with one expression per line. Lines may be
//! named (`name: expression`) and referenced by any other line, in any order.
//!
//! Compilation pipeline:
//! - tokenize each line
//! - resolve declarations and build the line dependency graph
//! - reject cyclic documents, then schedule lines in dependency order
//! - parse each line into an expression tree
//!
//! Execution then evaluates the lines in schedule order, carrying units
//! through arithmetic.

pub mod evaluator;
pub mod graph;
pub mod highlight;
pub mod parser;
pub mod token;
pub mod types;


pub use evaluator::{evaluate_source, parse_number_literal, EvalContext, EvalError};
pub use highlight::{highlight, highlight_line, render_html, HighlightClass, HighlightedToken};
pub use parser::{
    parse_line, parse_unit_nodes, Ast, Constant, Function, Operator, ParseError, UnitNode, MAX_DEPTH,
};
pub use token::{tokenize, Token, TokenKind, TokenizeError, TokenizeMode};
pub use types::{format_number, Document, DocumentError, Line, LineError, LineOutcome};
