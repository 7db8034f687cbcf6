//! AST evaluator.
//!
//! Lines are evaluated once each, in execution order, so every variable a
//! line references already holds its value (or its error) when the line runs.

use super::parser::{Ast, Function, Operator};
use super::types::{Document, DocumentError};
use crate::units::{CompositeUnit, UnitCatalog, UnitError, DEGREES, RADIANS};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Invalid number literal: '{0}'")]
    InvalidNumber(String),
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Referring to a variable defined by an empty expression: {0}")]
    EmptyReference(String),
    #[error("Referring to a variable whose definition has an error: {0}")]
    ErroredReference(String),
    #[error("Exponent must be a number with no unit")]
    ExponentWithUnit,
    #[error("Cannot evaluate an empty expression")]
    EmptyExpression,
    #[error("Unexpected {0} node")]
    UnexpectedNode(&'static str),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Read a number as written in source: `.` groups digits, `,` is the decimal
/// separator and a trailing `%` divides by 100.
pub fn parse_number_literal(text: &str) -> Result<f64, EvalError> {
    let normalized = text.replace('.', "").replace(',', ".");

    let (digits, percent) = match normalized.strip_suffix('%') {
        Some(digits) => (digits, true),
        None => (normalized.as_str(), false),
    };

    let value: f64 = digits
        .parse()
        .map_err(|_| EvalError::InvalidNumber(text.to_string()))?;

    Ok(if percent { value / 100.0 } else { value })
}

/// Value of an angle in radians, when `unit` is exactly `rad` or `deg`.
fn as_radians(value: f64, unit: &CompositeUnit) -> Option<f64> {
    unit.single_unit()
        .filter(|u| u.id == RADIANS || u.id == DEGREES)
        .map(|u| u.to_base(value))
}

/// Angles in `rad` or `deg` are taken in radians and give a unitless result;
/// anything else is used as is and keeps its unit.
fn trig(f: fn(f64) -> f64, value: f64, unit: CompositeUnit) -> (f64, CompositeUnit) {
    match as_radians(value, &unit) {
        Some(radians) => (f(radians), CompositeUnit::new()),
        None => (f(value), unit),
    }
}

/// Evaluation context
pub struct EvalContext<'a> {
    document: &'a Document,
}

impl<'a> EvalContext<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    fn eval_variable(&self, name: &str) -> Result<(f64, CompositeUnit), EvalError> {
        let line = self
            .document
            .line_by_name(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))?;

        if line.is_empty() {
            return Err(EvalError::EmptyReference(name.to_string()));
        }
        if line.has_error() {
            return Err(EvalError::ErroredReference(name.to_string()));
        }

        Ok((line.value, line.unit.clone()))
    }

    fn eval_operator(
        &self,
        operator: Operator,
        lhs: &Ast,
        rhs: &Ast,
    ) -> Result<(f64, CompositeUnit), EvalError> {
        let (a, unit_a) = self.eval(lhs)?;
        let (b, unit_b) = self.eval(rhs)?;

        match operator {
            Operator::Add => {
                let b = unit_b.convert(b, &unit_a)?;
                Ok((a + b, unit_a))
            }
            // the difference is unitless
            Operator::Sub => {
                let b = unit_b.convert(b, &unit_a)?;
                Ok((a - b, CompositeUnit::new()))
            }
            Operator::Mul => Ok(CompositeUnit::product(a, &unit_a, b, &unit_b)),
            Operator::Div => Ok(CompositeUnit::division(a, &unit_a, b, &unit_b)),
            Operator::Pow => {
                if !unit_b.is_empty() {
                    return Err(EvalError::ExponentWithUnit);
                }
                Ok((a.powf(b), unit_a.powf(b)))
            }
        }
    }

    fn eval_function(&self, function: Function, arg: &Ast) -> Result<(f64, CompositeUnit), EvalError> {
        let (value, unit) = self.eval(arg)?;

        let result = match function {
            Function::Sqrt => (value.sqrt(), unit.powf(0.5)),
            Function::Log => (value.log10(), unit),
            Function::Ln => (value.ln(), unit),
            Function::Sin => trig(f64::sin, value, unit),
            Function::Cos => trig(f64::cos, value, unit),
            Function::Tan => trig(f64::tan, value, unit),
            Function::Abs => (value.abs(), unit),
            Function::Round => (value.round(), unit),
            Function::Ceil => (value.ceil(), unit),
            Function::Floor => (value.floor(), unit),
        };
        Ok(result)
    }

    /// Evaluate a node to a value and its unit.
    pub fn eval(&self, ast: &Ast) -> Result<(f64, CompositeUnit), EvalError> {
        match ast {
            Ast::NumberLiteral(text) => Ok((parse_number_literal(text)?, CompositeUnit::new())),

            Ast::Variable(name) => self.eval_variable(name),

            Ast::Constant(constant) => Ok((constant.value(), CompositeUnit::new())),

            Ast::Expression { params, unit } => {
                let operand = params.first().ok_or(EvalError::EmptyExpression)?;
                let (value, value_unit) = self.eval(operand)?;

                if unit.is_empty() {
                    Ok((value, value_unit))
                } else if value_unit.is_empty() {
                    Ok((value, unit.clone()))
                } else {
                    Ok((value_unit.convert(value, unit)?, unit.clone()))
                }
            }

            Ast::Operator { operator, lhs, rhs } => self.eval_operator(*operator, lhs, rhs),

            Ast::Function { function, arg } => self.eval_function(*function, arg),

            Ast::RawOperator(_) | Ast::UnitExpression { .. } => {
                Err(EvalError::UnexpectedNode(ast.kind()))
            }
        }
    }
}

impl Document {
    /// Evaluate every parsed line in execution order. Failures are recorded on
    /// the line and surface again in the lines referencing it.
    pub fn execute(&mut self) {
        for position in 0..self.execution_order.len() {
            let index = self.execution_order[position];
            let line = &self.lines[index];

            if line.is_empty() || line.has_error() {
                continue;
            }
            let Some(ast) = &line.ast else {
                continue;
            };

            let result = EvalContext::new(self).eval(ast);

            let line = &mut self.lines[index];
            match result {
                Ok((value, unit)) => {
                    line.value = value;
                    line.unit = unit;
                }
                Err(err) => {
                    debug!(line = index + 1, error = %err, "line failed to evaluate");
                    line.error = Some(err.into());
                }
            }
        }

        debug!(
            lines = self.lines.len(),
            errors = self.lines.iter().filter(|l| l.has_error()).count(),
            "document executed"
        );
    }
}

/// Compile and run a whole document.
pub fn evaluate_source(source: &str, catalog: &UnitCatalog) -> Result<Document, DocumentError> {
    let mut document = Document::parse(source, catalog)?;
    document.execute();
    Ok(document)
}
