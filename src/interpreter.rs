// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::builtins::comparison::{compare, truthy};
use crate::builtins::temporal::TemporalOp;
use crate::builtins::time::parse_timestamp;
use crate::builtins::types::length_of;
use crate::builtins::{Builtin, Dispatch};
use crate::context::DataContext;
use crate::error::SyntaxError;
use crate::number::Number;
use crate::parser::{parse_expression, MAX_EXPRESSION_DEPTH};
use crate::value::Value;
use crate::version::ExpressionVersion;
use crate::*;

use core::fmt;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use num_bigint::BigInt;

/// Intermediate result of evaluating a sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A field path that resolved to nothing.
    Undefined,
    Value(Value),
    /// Exact integer produced by an arbitrary-precision builtin.
    Integer(BigInt),
}

impl Operand {
    pub fn is_nullish(&self) -> bool {
        matches!(self, Operand::Undefined | Operand::Value(Value::Null))
    }

    pub fn into_value(self) -> Value {
        match self {
            Operand::Undefined => Value::Null,
            Operand::Value(v) => v,
            Operand::Integer(i) => Value::from(Number::from_bigint(i)),
        }
    }

    fn from_lookup(v: Option<&Value>) -> Self {
        v.map(|v| Operand::Value(v.clone()))
            .unwrap_or(Operand::Undefined)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Value(Value::Bool(b))
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Undefined => f.write_str("undefined"),
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Integer(i) => write!(f, "{i}"),
        }
    }
}

// Where a field path starts resolving.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Root {
    Current,
    Previous,
}

/// Evaluates parsed expressions against one data context.
///
/// Evaluation never fails: absent fields are undefined and malformed
/// numeric input degrades to zero.
pub struct Interpreter<'ctx> {
    ctx: &'ctx DataContext,
    // `.every` parameters, innermost last.
    scopes: Vec<(Rc<str>, Value)>,
    // What `now()` reports. Read from the system clock on first use unless
    // frozen by an evaluation timestamp.
    now: Option<DateTime<Utc>>,
}

impl<'ctx> Interpreter<'ctx> {
    pub fn new(ctx: &'ctx DataContext) -> Self {
        Self {
            ctx,
            scopes: vec![],
            now: None,
        }
    }

    /// Freeze `now()` at an ISO-8601 timestamp so that time-dependent
    /// expressions replay identically. A malformed timestamp is ignored
    /// and the system clock is used.
    pub fn with_evaluation_timestamp(mut self, timestamp: Option<&str>) -> Self {
        if let Some(ts) = timestamp {
            self.now = parse_timestamp(ts);
            if self.now.is_none() {
                debug!("ignoring malformed evaluation timestamp `{ts}`");
            }
        }
        self
    }

    fn clock(&mut self) -> DateTime<Utc> {
        *self.now.get_or_insert_with(Utc::now)
    }

    /// Evaluate to a boolean verdict.
    pub fn eval_bool(&mut self, expr: &ExprRef) -> bool {
        truthy(&self.eval_expr(expr))
    }

    pub fn eval_expr(&mut self, expr: &ExprRef) -> Operand {
        match expr.as_ref() {
            Expr::Null(_) => Operand::Value(Value::Null),
            Expr::Bool { value, .. } => Operand::from(*value),
            Expr::Number { value, .. } => Operand::Value(Value::Number(value.clone())),
            Expr::String { value, .. } => Operand::Value(Value::String(value.clone())),
            Expr::Path(path) => self.eval_path(path, Root::Current),
            Expr::List { items, .. } => {
                let values = items
                    .iter()
                    .map(|p| self.eval_path(p, Root::Current).into_value())
                    .collect::<Vec<_>>();
                Operand::Value(Value::from(values))
            }
            Expr::Not {
                negations, expr, ..
            } => {
                let v = self.eval_bool(expr);
                Operand::from(v ^ (negations % 2 == 1))
            }
            Expr::Compare { op, lhs, rhs, .. } => {
                let lhs = self.eval_expr(lhs);
                let rhs = self.eval_expr(rhs);
                Operand::from(compare(*op, &lhs, &rhs))
            }
            Expr::And { operands, .. } => {
                Operand::from(operands.iter().all(|e| self.eval_bool(e)))
            }
            Expr::Or { operands, .. } => {
                Operand::from(operands.iter().any(|e| self.eval_bool(e)))
            }
            Expr::Implies {
                antecedent,
                consequent,
                ..
            } => Operand::from(!self.eval_bool(antecedent) || self.eval_bool(consequent)),
            Expr::Call { builtin, args, .. } => self.eval_call(*builtin, args),
            Expr::Temporal { op, path, .. } => self.eval_temporal(*op, path),
        }
    }

    fn eval_call(&mut self, builtin: Builtin, params: &[ExprRef]) -> Operand {
        let args: Vec<Operand> = params.iter().map(|p| self.eval_expr(p)).collect();
        trace!("calling `{builtin}` with {} argument(s)", args.len());
        match builtin.dispatch() {
            Dispatch::Values(f) => f(&args),
            Dispatch::Clock(f) => {
                let now = self.clock();
                f(&args, &now)
            }
        }
    }

    fn eval_temporal(&mut self, op: TemporalOp, path: &FieldPath) -> Operand {
        let current = self.eval_path(path, Root::Current);
        let previous = if self.ctx.has_previous() {
            Some(self.eval_path(path, Root::Previous))
        } else {
            None
        };
        trace!(
            "calling `{op}` on `{}` (history: {})",
            path.dotted(),
            previous.is_some()
        );
        op.apply(&current, previous.as_ref())
    }

    fn lookup_local_var(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    fn resolve(&self, segments: &[Rc<str>], root: Root) -> Operand {
        match root {
            Root::Previous => Operand::from_lookup(self.ctx.lookup_previous(segments)),
            Root::Current => match segments.split_first() {
                Some((name, rest)) => match self.lookup_local_var(name) {
                    Some(v) => Operand::from_lookup(v.get_path(rest.iter())),
                    None => Operand::from_lookup(self.ctx.lookup(segments)),
                },
                None => Operand::Undefined,
            },
        }
    }

    fn eval_path(&mut self, path: &FieldPath, root: Root) -> Operand {
        let value = self.resolve(&path.segments, root);
        match &path.suffix {
            None => value,
            Some(PathSuffix::Length { .. }) => {
                Operand::Value(Value::from(length_of(&value, false)))
            }
            Some(PathSuffix::Every { param, body, .. }) => {
                Operand::from(self.eval_every(path, value, param, body))
            }
        }
    }

    fn eval_every(
        &mut self,
        path: &FieldPath,
        domain: Operand,
        param: &Rc<str>,
        body: &ExprRef,
    ) -> bool {
        let Operand::Value(Value::Array(items)) = &domain else {
            debug!("`{}.every` target is not an array: `{domain}`", path.dotted());
            return false;
        };

        let mut r = true;
        for item in items.iter() {
            self.scopes.push((param.clone(), item.clone()));
            let ok = self.eval_bool(body);
            self.scopes.pop();
            if !ok {
                r = false;
                break;
            }
        }
        r
    }
}

/// Evaluate `expr` against `data` using the latest grammar.
///
/// Fails only when the expression is malformed or nested too deeply.
pub fn evaluate(expr: &str, data: &DataContext) -> Result<bool, SyntaxError> {
    evaluate_with_version(expr, data, ExpressionVersion::LATEST, None)
}

/// Evaluate `expr` under the grammar of a specific `expression_version`.
///
/// `evaluation_timestamp`, when a valid ISO-8601 timestamp, is what `now()`
/// returns; otherwise `now()` reads the system clock.
pub fn evaluate_with_version(
    expr: &str,
    data: &DataContext,
    version: ExpressionVersion,
    evaluation_timestamp: Option<&str>,
) -> Result<bool, SyntaxError> {
    let parsed = parse_expression(expr, version, MAX_EXPRESSION_DEPTH)?;
    Ok(Interpreter::new(data)
        .with_evaluation_timestamp(evaluation_timestamp)
        .eval_bool(&parsed))
}
