//! Expression evaluation against a context snapshot.

use crate::EvalError;
use crate::parser::{CmpOp, Expr, Function, Variable};
use hearth_core::{ResolutionContext, Weekday};
use std::collections::{BTreeMap, BTreeSet};

/// Work hours: 09:00 up to (not including) 17:00.
const WORK_HOURS: std::ops::Range<u32> = 9..17;
/// Daytime: 07:00 up to (not including) 19:00.
const DAYTIME_HOURS: std::ops::Range<u32> = 7..19;

/// Everything an expression may read.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub hour: u32,
    pub minute: u32,
    pub weekday: Weekday,
    pub state: &'a BTreeMap<String, serde_json::Value>,
    pub occupants: &'a BTreeSet<String>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        hour: u32,
        minute: u32,
        weekday: Weekday,
        state: &'a BTreeMap<String, serde_json::Value>,
        occupants: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            hour,
            minute,
            weekday,
            state,
            occupants,
        }
    }
}

impl<'a> From<&'a ResolutionContext> for EvalContext<'a> {
    fn from(ctx: &'a ResolutionContext) -> Self {
        Self {
            hour: ctx.hour(),
            minute: ctx.minute(),
            weekday: ctx.weekday(),
            state: &ctx.state,
            occupants: &ctx.occupants,
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Set(Vec<String>),
}

impl Value {
    /// Truthiness used when a value stands alone as a condition.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => {
                let s = s.trim();
                !s.is_empty() && !s.eq_ignore_ascii_case("off") && !s.eq_ignore_ascii_case("false")
            }
            Value::Set(items) => !items.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Set(_) => "set",
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Num(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => n.as_f64().map(Value::Num).unwrap_or(Value::Null),
            J::String(s) => Value::Str(s.clone()),
            J::Array(items) => Value::Set(
                items
                    .iter()
                    .map(|item| match item {
                        J::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            J::Object(_) => Value::Str(json.to_string()),
        }
    }
}

impl Expr {
    /// Evaluate as a condition.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match self {
            Expr::And(a, b) => Ok(a.evaluate(ctx)? && b.evaluate(ctx)?),
            Expr::Or(a, b) => Ok(a.evaluate(ctx)? || b.evaluate(ctx)?),
            Expr::Not(inner) => Ok(!inner.evaluate(ctx)?),
            other => Ok(other.value(ctx)?.truthy()),
        }
    }

    /// Evaluate to a value.
    pub fn value(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match self {
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Var(Variable::Hour) => Ok(Value::Num(ctx.hour as f64)),
            Expr::Var(Variable::Minute) => Ok(Value::Num(ctx.minute as f64)),
            Expr::Var(Variable::Weekday) => Ok(Value::Str(ctx.weekday.as_str().into())),
            Expr::Call(function) => Ok(call(function, ctx)),
            Expr::And(..) | Expr::Or(..) | Expr::Not(_) => Ok(Value::Bool(self.evaluate(ctx)?)),
            Expr::Compare(left, op, right) => {
                let left = left.value(ctx)?;
                let right = right.value(ctx)?;
                compare(&left, *op, &right).map(Value::Bool)
            }
            Expr::In {
                needle,
                haystack,
                negated,
            } => {
                let needle = needle.value(ctx)?;
                let haystack = haystack.value(ctx)?;
                let found = contains(&haystack, &needle)?;
                Ok(Value::Bool(found != *negated))
            }
        }
    }
}

fn call(function: &Function, ctx: &EvalContext<'_>) -> Value {
    match function {
        Function::IsWeekday => Value::Bool(!ctx.weekday.is_weekend()),
        Function::IsWeekend => Value::Bool(ctx.weekday.is_weekend()),
        Function::IsDaytime => Value::Bool(DAYTIME_HOURS.contains(&ctx.hour)),
        Function::IsWorkHours => Value::Bool(WORK_HOURS.contains(&ctx.hour)),
        Function::Occupants => Value::Set(ctx.occupants.iter().cloned().collect()),
        Function::State(name) => ctx.state.get(name).map(Value::from).unwrap_or(Value::Null),
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(loosely_equal(left, right)),
        CmpOp::NotEq => Ok(!loosely_equal(left, right)),
        _ => {
            // A missing state value never satisfies an ordering.
            if matches!(left, Value::Null) || matches!(right, Value::Null) {
                return Ok(false);
            }
            let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                return Err(EvalError::TypeMismatch(format!(
                    "cannot order {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            };
            Ok(match op {
                CmpOp::Lt => a < b,
                CmpOp::Lte => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Gte => a >= b,
                CmpOp::Eq | CmpOp::NotEq => unreachable!("handled above"),
            })
        }
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Bool(b), Value::Str(s)) | (Value::Str(s), Value::Bool(b)) => {
            s.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Value::Str(a), Value::Str(b)) => a.eq_ignore_ascii_case(b),
        (Value::Set(a), Value::Set(b)) => {
            let a: BTreeSet<&String> = a.iter().collect();
            let b: BTreeSet<&String> = b.iter().collect();
            a == b
        }
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
            _ => false,
        },
    }
}

fn contains(haystack: &Value, needle: &Value) -> Result<bool, EvalError> {
    let Some(needle_text) = needle.as_text() else {
        return if matches!(needle, Value::Null) {
            Ok(false)
        } else {
            Err(EvalError::TypeMismatch(format!(
                "cannot test membership of a {}",
                needle.type_name()
            )))
        };
    };
    match haystack {
        Value::Null => Ok(false),
        Value::Set(items) => Ok(items.iter().any(|item| *item == needle_text)),
        Value::Str(s) => Ok(s.to_lowercase().contains(&needle_text.to_lowercase())),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot test membership in a {}",
            other.type_name()
        ))),
    }
}
