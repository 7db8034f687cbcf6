//! Expression parser.
//!
//! Parsing a line runs in two stages:
//! - a recursive-descent walk resolving parentheses, unit brackets, names and
//!   function calls, leaving operators in place as `RawOperator` nodes
//! - five folding passes, one per operator in the order `^ * / - +`, each
//!   turning `lhs op rhs` runs into binary `Operator` nodes
//!
//! Unit brackets use a small grammar of their own: unit names, `^` followed
//! by a number and at most one `/`.

use super::token::{Token, TokenKind};
use super::types::{Document, LineError};
use crate::units::{CompositeUnit, FundamentalUnit, UnitCatalog, UnitError, UnitExponent};
use std::collections::HashMap;
use std::f64::consts;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Line ends unexpectedly")]
    UnexpectedEnd,
    #[error("Unrecognized syntax: '{0}'")]
    UnrecognizedSyntax(String),
    #[error("Unknown name: '{0}'")]
    UnknownName(String),
    #[error("Unrecognized unit syntax: '{0}'")]
    UnrecognizedUnitSyntax(String),
    #[error("Failed to parse unit expression: {0}")]
    InvalidUnit(String),
    #[error("Function {0} needs a value as argument")]
    InvalidFunctionArgument(Function),
    #[error("Cannot start expression with operation {0}")]
    LeadingOperator(Operator),
    #[error("Cannot end expression with operation {0}")]
    TrailingOperator(Operator),
    #[error("Cannot have 2 operations consecutively")]
    ConsecutiveOperators,
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Missing operation between values")]
    MissingOperator,
    #[error("Expression is nested more than {} levels deep", MAX_DEPTH)]
    NestingTooDeep,
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Deepest expression tree a line may build, counting groups, function
/// arguments and chained operators.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    /// Folding order; earlier passes bind tighter.
    pub const PRECEDENCE_PASSES: [Operator; 5] =
        [Self::Pow, Self::Mul, Self::Div, Self::Sub, Self::Add];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "^" => Some(Self::Pow),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Built-in single-argument functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Log,
    Ln,
    Sin,
    Cos,
    Tan,
    Abs,
    Round,
    Ceil,
    Floor,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "log" => Some(Self::Log),
            "ln" => Some(Self::Ln),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "abs" => Some(Self::Abs),
            "round" => Some(Self::Round),
            "ceil" => Some(Self::Ceil),
            "floor" => Some(Self::Floor),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Abs => "abs",
            Self::Round => "round",
            Self::Ceil => "ceil",
            Self::Floor => "floor",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" => Some(Self::Pi),
            "e" => Some(Self::E),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "e",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Pi => consts::PI,
            Self::E => consts::E,
        }
    }
}

/// Atoms found inside a unit bracket
#[derive(Debug, Clone, PartialEq)]
pub enum UnitNode {
    /// A unit from the catalog
    FundamentalUnit(FundamentalUnit),
    /// A name the catalog does not know; becomes a unit of its own
    CustomUnit(String),
    UnitNumberLiteral(String),
    /// `^`
    UnitExponent,
    /// `/`
    UnitDivision,
}

impl fmt::Display for UnitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FundamentalUnit(unit) => write!(f, "[FundamentalUnit] {}", unit.id),
            Self::CustomUnit(name) => write!(f, "[CustomUnit] {}", name),
            Self::UnitNumberLiteral(text) => write!(f, "[UnitNumberLiteral] {}", text),
            Self::UnitExponent => f.write_str("[UnitExponent] ^"),
            Self::UnitDivision => f.write_str("[UnitDivision] /"),
        }
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// Number as written, e.g. "1.000,5" or "15%"
    NumberLiteral(String),
    /// Reference to a declared variable
    Variable(String),
    Constant(Constant),
    Function {
        function: Function,
        arg: Box<Ast>,
    },
    /// Binary operation
    Operator {
        operator: Operator,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    /// Operator not folded yet
    RawOperator(Operator),
    /// Parenthesized group or whole line, with the unit its brackets attach
    Expression {
        params: Vec<Ast>,
        unit: CompositeUnit,
    },
    /// Unit bracket; only lives until it is attached to its expression
    UnitExpression {
        nodes: Vec<UnitNode>,
        unit: CompositeUnit,
    },
}

impl Ast {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NumberLiteral(_) => "NumberLiteral",
            Self::Variable(_) => "Variable",
            Self::Constant(_) => "Constant",
            Self::Function { .. } => "Function",
            Self::Operator { .. } => "Operator",
            Self::RawOperator(_) => "RawOperator",
            Self::Expression { .. } => "Expression",
            Self::UnitExpression { .. } => "UnitExpression",
        }
    }

    /// Levels of the tree rooted at this node, the node itself included.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut pending = vec![(self, 1)];

        while let Some((node, level)) = pending.pop() {
            height = height.max(level);
            match node {
                Self::Function { arg, .. } => pending.push((&**arg, level + 1)),
                Self::Operator { lhs, rhs, .. } => {
                    pending.push((&**lhs, level + 1));
                    pending.push((&**rhs, level + 1));
                }
                Self::Expression { params, .. } => {
                    pending.extend(params.iter().map(|param| (param, level + 1)))
                }
                _ => {}
            }
        }
        height
    }

    fn value(&self) -> String {
        match self {
            Self::NumberLiteral(text) | Self::Variable(text) => text.clone(),
            Self::Constant(constant) => constant.name().to_string(),
            Self::Function { function, .. } => function.name().to_string(),
            Self::Operator { operator, .. } | Self::RawOperator(operator) => {
                operator.symbol().to_string()
            }
            Self::Expression { unit, .. } | Self::UnitExpression { unit, .. } => unit.to_string(),
        }
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, child: &dyn fmt::Display) -> fmt::Result {
    for line in child.to_string().lines() {
        write!(f, "\n  {}", line)?;
    }
    Ok(())
}

impl fmt::Display for Ast {
    /// One `[Kind] value` line per node, children indented below their parent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value();
        if value.is_empty() {
            write!(f, "[{}]", self.kind())?;
        } else {
            write!(f, "[{}] {}", self.kind(), value)?;
        }

        match self {
            Self::Function { arg, .. } => write_indented(f, &**arg),
            Self::Operator { lhs, rhs, .. } => {
                write_indented(f, &**lhs)?;
                write_indented(f, &**rhs)
            }
            Self::Expression { params, .. } => {
                params.iter().try_for_each(|param| write_indented(f, param))
            }
            Self::UnitExpression { nodes, .. } => {
                nodes.iter().try_for_each(|node| write_indented(f, node))
            }
            _ => Ok(()),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    variables: &'a HashMap<String, usize>,
    catalog: &'a UnitCatalog,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Result<&'a Token, ParseError> {
        self.tokens.get(self.current).ok_or(ParseError::UnexpectedEnd)
    }

    fn next_token(&mut self) -> Result<&'a Token, ParseError> {
        let token = self.peek()?;
        self.current += 1;
        Ok(token)
    }

    /// Parse one operand, operator or bracket.
    fn walk(&mut self) -> Result<Ast, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::NestingTooDeep);
        }

        self.depth += 1;
        let ast = self.walk_token();
        self.depth -= 1;
        ast
    }

    fn walk_token(&mut self) -> Result<Ast, ParseError> {
        let token = self.next_token()?;

        match token.kind {
            TokenKind::Number => Ok(Ast::NumberLiteral(token.text.clone())),
            TokenKind::Paren if token.text == "(" => self.walk_group(),
            TokenKind::Bracket if token.text == "[" => self.walk_unit_bracket(),
            TokenKind::Literal => self.walk_name(token),
            TokenKind::Operator => Operator::from_symbol(&token.text)
                .map(Ast::RawOperator)
                .ok_or_else(|| ParseError::UnrecognizedSyntax(token.text.clone())),
            _ => Err(ParseError::UnrecognizedSyntax(token.text.clone())),
        }
    }

    /// Contents of `( ... )`; the opening paren is already consumed.
    fn walk_group(&mut self) -> Result<Ast, ParseError> {
        let mut params = Vec::new();
        let mut unit = CompositeUnit::new();

        while !self.peek()?.is(TokenKind::Paren, ")") {
            attach(self.walk()?, &mut params, &mut unit);
        }
        self.current += 1;

        Ok(Ast::Expression { params, unit })
    }

    /// Contents of `[ ... ]`; the opening bracket is already consumed.
    fn walk_unit_bracket(&mut self) -> Result<Ast, ParseError> {
        let mut nodes = Vec::new();

        while !self.peek()?.is(TokenKind::Bracket, "]") {
            nodes.push(self.walk_unit()?);
        }
        self.current += 1;

        let unit = parse_unit_nodes(&nodes)?;
        Ok(Ast::UnitExpression { nodes, unit })
    }

    fn walk_unit(&mut self) -> Result<UnitNode, ParseError> {
        let token = self.next_token()?;

        match token.kind {
            TokenKind::Number => Ok(UnitNode::UnitNumberLiteral(token.text.clone())),
            TokenKind::Literal => Ok(match self.catalog.resolve_alias(&token.text) {
                Some(unit) => UnitNode::FundamentalUnit(unit),
                None => UnitNode::CustomUnit(token.text.clone()),
            }),
            TokenKind::Operator if token.text == "^" => Ok(UnitNode::UnitExponent),
            TokenKind::Operator if token.text == "/" => Ok(UnitNode::UnitDivision),
            _ => Err(ParseError::UnrecognizedUnitSyntax(token.text.clone())),
        }
    }

    /// Literals are constants, then variables, then functions.
    fn walk_name(&mut self, token: &Token) -> Result<Ast, ParseError> {
        let name = token.text.as_str();

        if let Some(constant) = Constant::from_name(name) {
            return Ok(Ast::Constant(constant));
        }

        if self.variables.contains_key(name) {
            return Ok(Ast::Variable(name.to_string()));
        }

        let function =
            Function::from_name(name).ok_or_else(|| ParseError::UnknownName(name.to_string()))?;

        match self.walk()? {
            Ast::RawOperator(_) | Ast::UnitExpression { .. } => {
                Err(ParseError::InvalidFunctionArgument(function))
            }
            arg => Ok(Ast::Function {
                function,
                arg: Box::new(arg),
            }),
        }
    }
}

/// Unit brackets attach to the enclosing expression, the last one winning.
fn attach(ast: Ast, params: &mut Vec<Ast>, unit: &mut CompositeUnit) {
    match ast {
        Ast::UnitExpression { unit: bracket, .. } => *unit = bracket,
        other => params.push(other),
    }
}

/// Build the unit a bracket denotes.
///
/// `/` negates the exponents of every unit after it, `^n` sets the exponent
/// of the unit just before it, and a number ahead of the first unit is
/// ignored so that `[1/s]` reads naturally.
pub fn parse_unit_nodes(nodes: &[UnitNode]) -> Result<CompositeUnit, ParseError> {
    let mut factors: Vec<UnitExponent> = Vec::new();
    let mut sign = 1.0;
    // whether the last unit already had its exponent set
    let mut exponent_set = false;
    let mut nodes = nodes.iter();

    while let Some(node) = nodes.next() {
        match node {
            UnitNode::FundamentalUnit(unit) => {
                factors.push(UnitExponent::new(unit.clone(), sign));
                exponent_set = false;
            }
            UnitNode::CustomUnit(name) => {
                factors.push(UnitExponent::new(FundamentalUnit::custom(name), sign));
                exponent_set = false;
            }
            UnitNode::UnitDivision if sign > 0.0 => sign = -1.0,
            UnitNode::UnitDivision => {
                return Err(ParseError::InvalidUnit(
                    "a unit can contain only one division".to_string(),
                ))
            }
            UnitNode::UnitExponent => {
                let last = match factors.last_mut() {
                    Some(last) if !exponent_set => last,
                    Some(last) => {
                        return Err(ParseError::InvalidUnit(format!(
                            "{} has more than one exponent",
                            last.unit.symbol
                        )))
                    }
                    None => {
                        return Err(ParseError::InvalidUnit(
                            "an exponent must follow a unit".to_string(),
                        ))
                    }
                };

                let text = match nodes.next() {
                    Some(UnitNode::UnitNumberLiteral(text)) => text,
                    _ => {
                        return Err(ParseError::InvalidUnit(
                            "an exponent must be a number".to_string(),
                        ))
                    }
                };

                let exponent: f64 = text
                    .parse()
                    .map_err(|_| ParseError::InvalidUnit(format!("invalid exponent '{}'", text)))?;
                last.exponent = exponent * sign;
                exponent_set = true;
            }
            UnitNode::UnitNumberLiteral(_) if factors.is_empty() => {}
            UnitNode::UnitNumberLiteral(text) => {
                return Err(ParseError::InvalidUnit(format!("unexpected number '{}'", text)))
            }
        }
    }

    Ok(CompositeUnit::from_factors(factors)?)
}

/// Fold every `RawOperator(operator)` into a binary node, recursively.
/// `depth` is the level of `ast` in the line's tree, the root being 1.
fn fold(ast: Ast, operator: Operator, depth: usize) -> Result<Ast, ParseError> {
    match ast {
        Ast::Function { function, arg } => Ok(Ast::Function {
            function,
            arg: Box::new(fold(*arg, operator, depth + 1)?),
        }),
        Ast::Operator {
            operator: op,
            lhs,
            rhs,
        } => Ok(Ast::Operator {
            operator: op,
            lhs: Box::new(fold(*lhs, operator, depth + 1)?),
            rhs: Box::new(fold(*rhs, operator, depth + 1)?),
        }),
        Ast::Expression { params, unit } => Ok(Ast::Expression {
            params: fold_expression(params, operator, depth)?,
            unit,
        }),
        leaf => Ok(leaf),
    }
}

/// Fold the operands of an expression sitting at level `depth`. Operator
/// chains nest to the left, so each link adds a level; the chain is cut off
/// once the tree would exceed `MAX_DEPTH`.
fn fold_expression(
    params: Vec<Ast>,
    operator: Operator,
    depth: usize,
) -> Result<Vec<Ast>, ParseError> {
    // operands with their heights
    let mut folded: Vec<(Ast, usize)> = Vec::with_capacity(params.len());
    let mut params = params.into_iter().peekable();

    while let Some(param) = params.next() {
        match param {
            Ast::RawOperator(raw) if raw == operator => {
                if params.peek().is_none() {
                    return Err(ParseError::TrailingOperator(operator));
                }

                // a leading minus negates: `-x` is `0 - x`
                let (lhs, lhs_height) = match folded.pop() {
                    None if operator == Operator::Sub => (Ast::NumberLiteral("0".to_string()), 1),
                    None => return Err(ParseError::LeadingOperator(operator)),
                    Some((Ast::RawOperator(_), _)) => {
                        return Err(ParseError::ConsecutiveOperators)
                    }
                    Some(lhs) => lhs,
                };

                let rhs = match params.next() {
                    Some(Ast::RawOperator(_)) => return Err(ParseError::ConsecutiveOperators),
                    Some(rhs) => fold(rhs, operator, depth + 2)?,
                    None => return Err(ParseError::TrailingOperator(operator)),
                };

                let height = lhs_height.max(rhs.height()) + 1;
                if depth + height > MAX_DEPTH {
                    return Err(ParseError::NestingTooDeep);
                }

                let node = Ast::Operator {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                folded.push((node, height));
            }
            other => {
                let other = fold(other, operator, depth + 1)?;
                let height = other.height();
                folded.push((other, height));
            }
        }
    }

    Ok(folded.into_iter().map(|(ast, _)| ast).collect())
}

/// After folding, every expression holds exactly one operand.
fn check_folded(ast: &Ast) -> Result<(), ParseError> {
    match ast {
        Ast::Expression { params, .. } => match params.as_slice() {
            [] => Err(ParseError::EmptyExpression),
            [only] => check_folded(only),
            _ => Err(ParseError::MissingOperator),
        },
        Ast::Function { arg, .. } => check_folded(arg),
        Ast::Operator { lhs, rhs, .. } => {
            check_folded(lhs)?;
            check_folded(rhs)
        }
        Ast::RawOperator(operator) => Err(ParseError::UnrecognizedSyntax(operator.to_string())),
        _ => Ok(()),
    }
}

/// Parse the semantic tokens of one line into a folded expression tree.
pub fn parse_line(
    tokens: &[Token],
    variables: &HashMap<String, usize>,
    catalog: &UnitCatalog,
) -> Result<Ast, ParseError> {
    let mut parser = Parser {
        tokens,
        current: 0,
        variables,
        catalog,
        depth: 0,
    };

    let mut params = Vec::new();
    let mut unit = CompositeUnit::new();
    while !parser.at_end() {
        attach(parser.walk()?, &mut params, &mut unit);
    }

    let mut ast = Ast::Expression { params, unit };
    for operator in Operator::PRECEDENCE_PASSES {
        ast = fold(ast, operator, 1)?;
    }

    check_folded(&ast)?;
    Ok(ast)
}

impl Document {
    /// Parse every non-empty line; failures are recorded on the line.
    pub(crate) fn parse_lines(&mut self, catalog: &UnitCatalog) {
        let variables = &self.variables;

        for (index, line) in self.lines.iter_mut().enumerate() {
            if line.is_empty() || line.has_error() {
                continue;
            }

            match parse_line(&line.tokens, variables, catalog) {
                Ok(ast) => line.ast = Some(ast),
                Err(err) => {
                    debug!(line = index + 1, error = %err, "line failed to parse");
                    line.error = Some(LineError::from(err));
                }
            }
        }
    }
}
