// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::comparison::operands_equal;
use crate::builtins::utils::try_bigint;
use crate::interpreter::Operand;
use crate::value::Value;

use core::fmt;

use num_bigint::BigInt;
use num_traits::Zero;

/// Operators that compare a field against the previous snapshot. They take
/// a field path rather than an expression, so they are kept apart from
/// [`Builtin`](crate::builtins::Builtin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalOp {
    Changed,
    Previous,
    Delta,
}

impl TemporalOp {
    pub const ALL: &'static [TemporalOp] =
        &[TemporalOp::Changed, TemporalOp::Previous, TemporalOp::Delta];

    /// Grammar major version that introduced the temporal operators.
    pub const SINCE_MAJOR: u32 = 2;

    pub fn from_name(name: &str) -> Option<TemporalOp> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            TemporalOp::Changed => "changed",
            TemporalOp::Previous => "previous",
            TemporalOp::Delta => "delta",
        }
    }

    /// `previous` is `None` when the context carries no snapshot.
    pub fn apply(self, current: &Operand, prev: Option<&Operand>) -> Operand {
        match self {
            TemporalOp::Changed => changed(current, prev),
            TemporalOp::Previous => previous(current, prev),
            TemporalOp::Delta => delta(current, prev),
        }
    }
}

impl fmt::Display for TemporalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Each function receives the field's current value and, when a previous
// snapshot exists, the field's value in that snapshot.

pub fn changed(current: &Operand, previous: Option<&Operand>) -> Operand {
    Operand::from(match previous {
        Some(prev) => !operands_equal(current, prev),
        None => false,
    })
}

pub fn previous(_current: &Operand, previous: Option<&Operand>) -> Operand {
    match previous {
        Some(Operand::Undefined) | None => Operand::Value(Value::Null),
        Some(prev) => prev.clone(),
    }
}

fn as_decimal(v: &Operand) -> Option<f64> {
    let f = match v {
        Operand::Undefined | Operand::Value(Value::Null) => 0.0,
        Operand::Value(Value::Number(n)) => n.to_f64_lossy(),
        Operand::Value(Value::String(s)) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// `current - previous`. Integers subtract exactly; decimals fall back to
/// floating point; anything else is 0.
pub fn delta(current: &Operand, previous: Option<&Operand>) -> Operand {
    let Some(previous) = previous else {
        return Operand::Integer(BigInt::zero());
    };

    if let (Some(a), Some(b)) = (try_bigint(current), try_bigint(previous)) {
        return Operand::Integer(a - b);
    }

    match (as_decimal(current), as_decimal(previous)) {
        (Some(a), Some(b)) => Operand::Value(Value::from(a - b)),
        _ => {
            log::debug!("`delta` could not read `{current}` and `{previous}` as numbers; using 0");
            Operand::Integer(BigInt::zero())
        }
    }
}
