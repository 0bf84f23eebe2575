// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::interpreter::Operand;
use crate::value::Value;

use num_bigint::BigInt;
use num_traits::Zero;

/// Parse integer text the way arbitrary-precision fields are encoded:
/// ASCII whitespace is trimmed, blank text is zero, otherwise an optional
/// sign followed by decimal digits.
pub fn parse_integer_text(text: &str) -> Option<BigInt> {
    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Some(BigInt::zero());
    }

    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    Some(if negative { -value } else { value })
}

/// Arbitrary-precision view of an operand. `None` means the operand cannot
/// be read as an integer.
pub fn try_bigint(v: &Operand) -> Option<BigInt> {
    match v {
        Operand::Undefined => Some(BigInt::zero()),
        Operand::Integer(i) => Some(i.clone()),
        Operand::Value(Value::Null) => Some(BigInt::zero()),
        Operand::Value(Value::Bool(b)) => Some(BigInt::from(u8::from(*b))),
        Operand::Value(Value::Number(n)) => n.to_bigint(),
        Operand::Value(Value::String(s)) => parse_integer_text(s),
        Operand::Value(_) => None,
    }
}

/// Coerce an operand to an arbitrary-precision integer. Malformed input
/// degrades to zero.
pub fn ensure_bigint(fcn: &str, v: &Operand) -> BigInt {
    match try_bigint(v) {
        Some(i) => i,
        None => {
            log::debug!("`{fcn}` could not coerce `{v}` to an integer; using 0");
            BigInt::zero()
        }
    }
}

/// True only for values that are already integers or integer text.
/// Null, booleans and blank strings are not coercible here.
pub fn is_integer_like(v: &Operand) -> bool {
    match v {
        Operand::Integer(_) => true,
        Operand::Value(Value::Number(n)) => n.is_integer(),
        Operand::Value(Value::String(s)) => {
            !s.trim().is_empty() && parse_integer_text(s).is_some()
        }
        _ => false,
    }
}

pub fn ensure_string(v: &Operand) -> Option<&str> {
    match v {
        Operand::Value(Value::String(s)) => Some(s.as_ref()),
        _ => None,
    }
}

pub fn ensure_array(v: &Operand) -> Option<&[Value]> {
    match v {
        Operand::Value(Value::Array(a)) => Some(a.as_slice()),
        _ => None,
    }
}

/// Length in UTF-16 code units.
pub fn string_length(s: &str) -> usize {
    s.encode_utf16().count()
}
