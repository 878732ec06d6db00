//! Condition expressions: the small boolean language used by room layers.
//!
//! Conditions decide whether a sub-fragment of a room layer applies to the
//! current request. The language is deliberately closed: it reads the
//! clock fields of the [`EvalContext`], named state values, and the
//! occupant set, through a fixed whitelist of functions. Nothing is looked
//! up at evaluation time, so a given context always yields the same answer.
//!
//! # Example Conditions
//!
//! ```text
//! is_work_hours() and is_weekday()
//! hour >= 13 and hour < 15
//! state("tv") == "on" or state("guest_present")
//! "parent_b" in occupants() and not is_weekend()
//! weekday == "sunday"
//! ```
//!
//! Failures never escape as panics. A malformed expression compiles to an
//! [`EvalError`] that is reported each time the condition is evaluated, and
//! callers treat any error as "condition is false".

mod eval;
mod parser;

pub use eval::{EvalContext, Value};
pub use parser::{CmpOp, Expr, Function, Variable, parse_expr};

/// Errors from compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{function}' takes {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// An expression compiled once and evaluated many times.
///
/// Compilation errors are kept rather than returned, so a layer store can
/// load with a broken condition and report it when it is evaluated.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    source: String,
    parsed: Result<Expr, EvalError>,
}

impl CompiledExpr {
    pub fn compile(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = parse_expr(&source);
        Self { source, parsed }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compile error, if the expression did not parse.
    pub fn error(&self) -> Option<&EvalError> {
        self.parsed.as_ref().err()
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match &self.parsed {
            Ok(expr) => expr.evaluate(ctx),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Compile and evaluate in one step.
pub fn evaluate(expression: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
    parse_expr(expression)?.evaluate(ctx)
}
