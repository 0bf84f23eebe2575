// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::BoolOp;
use crate::builtins::utils::parse_integer_text;
use crate::interpreter::Operand;
use crate::number::Number;
use crate::value::Value;

use core::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::Zero;

fn ordering_satisfies(op: BoolOp, ord: Option<Ordering>) -> bool {
    let Some(ord) = ord else {
        // NaN, or no ordering between the operands.
        return op == BoolOp::Ne;
    };
    match op {
        BoolOp::Lt => ord == Ordering::Less,
        BoolOp::Le => ord != Ordering::Greater,
        BoolOp::Eq => ord == Ordering::Equal,
        BoolOp::Ge => ord != Ordering::Less,
        BoolOp::Gt => ord == Ordering::Greater,
        BoolOp::Ne => ord != Ordering::Equal,
    }
}

fn equality_only(op: BoolOp, equal: bool) -> bool {
    match op {
        BoolOp::Eq => equal,
        BoolOp::Ne => !equal,
        _ => false,
    }
}

fn compare_integer_with_number(i: &BigInt, n: &Number) -> Option<Ordering> {
    match n.to_bigint() {
        Some(other) => Some(i.cmp(&other)),
        None => Number::from_bigint(i.clone()).partial_cmp(n),
    }
}

/// Apply a comparison operator.
///
/// A null or undefined operand only supports `==`/`!=`, which then test
/// whether the other side is null or undefined as well. An integer produced
/// by an arbitrary-precision builtin reads integer text on the other side.
pub fn compare(op: BoolOp, lhs: &Operand, rhs: &Operand) -> bool {
    if lhs.is_nullish() || rhs.is_nullish() {
        return equality_only(op, lhs.is_nullish() && rhs.is_nullish());
    }

    match (lhs, rhs) {
        (Operand::Integer(a), Operand::Integer(b)) => ordering_satisfies(op, Some(a.cmp(b))),
        (Operand::Integer(a), Operand::Value(Value::Number(b))) => {
            ordering_satisfies(op, compare_integer_with_number(a, b))
        }
        (Operand::Value(Value::Number(a)), Operand::Integer(b)) => {
            ordering_satisfies(op, compare_integer_with_number(b, a).map(Ordering::reverse))
        }
        (Operand::Integer(a), Operand::Value(Value::String(s))) => match parse_integer_text(s) {
            Some(b) => ordering_satisfies(op, Some(a.cmp(&b))),
            None => equality_only(op, false),
        },
        (Operand::Value(Value::String(s)), Operand::Integer(b)) => match parse_integer_text(s) {
            Some(a) => ordering_satisfies(op, Some(a.cmp(b))),
            None => equality_only(op, false),
        },
        (Operand::Value(a), Operand::Value(b)) => compare_values(op, a, b),
        _ => equality_only(op, false),
    }
}

fn compare_values(op: BoolOp, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => ordering_satisfies(op, x.partial_cmp(y)),
        // Strings order by UTF-16 code unit.
        (Value::String(x), Value::String(y)) => {
            ordering_satisfies(op, Some(x.encode_utf16().cmp(y.encode_utf16())))
        }
        (Value::Bool(x), Value::Bool(y)) => equality_only(op, x == y),
        _ => equality_only(op, strict_equals(a, b)),
    }
}

/// Same kind and same value. No coercion between kinds.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| strict_equals(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).map(|r| strict_equals(l, r)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Strict equality lifted to operands. Integers equal numbers of the same value.
pub fn operands_equal(a: &Operand, b: &Operand) -> bool {
    match (a, b) {
        (Operand::Undefined, Operand::Undefined) => true,
        (Operand::Integer(x), Operand::Integer(y)) => x == y,
        (Operand::Integer(x), Operand::Value(Value::Number(n)))
        | (Operand::Value(Value::Number(n)), Operand::Integer(x)) => {
            n.to_bigint().as_ref() == Some(x)
        }
        (Operand::Value(x), Operand::Value(y)) => strict_equals(x, y),
        _ => false,
    }
}

/// Truthiness used by `!`, `&&`, `||`, `=>` and the final result.
pub fn truthy(v: &Operand) -> bool {
    match v {
        Operand::Undefined => false,
        Operand::Integer(i) => !i.is_zero(),
        Operand::Value(Value::Null) => false,
        Operand::Value(Value::Bool(b)) => *b,
        Operand::Value(Value::Number(n)) => !(n.is_zero() || n.is_nan()),
        Operand::Value(Value::String(s)) => !s.is_empty(),
        Operand::Value(Value::Array(_)) | Operand::Value(Value::Object(_)) => true,
    }
}
