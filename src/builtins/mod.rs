// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod bigint;
pub mod comparison;
pub mod temporal;
pub mod time;
pub mod types;
pub mod utils;

use crate::interpreter::Operand;
use crate::builtins::temporal::TemporalOp;

use core::fmt;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;

pub type BuiltinFcn = fn(&[Operand]) -> Operand;

/// A builtin that also reads the evaluation time.
pub type ClockFcn = fn(&[Operand], &DateTime<Utc>) -> Operand;

/// The closed set of functions an expression may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    BigintSum,
    BigintGte,
    BigintGt,
    BigintEq,
    BigintAdd,
    BigintSub,
    Eq,
    Len,
    TypeOf,
    IsBigintCoercible,
    ObjectKeysSubset,
    UniqueValues,
    IsAfter,
    IsBefore,
    IsBetween,
    IsStale,
    IsWithin,
    Now,
}

/// How a builtin's arguments are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arguments {
    /// One primary, optionally followed by a second: `bigint_sum`.
    Primaries { min: usize, max: usize },

    /// A fixed number of full expressions.
    Exprs(usize),
}

pub(crate) enum Dispatch {
    Values(BuiltinFcn),
    Clock(ClockFcn),
}

#[rustfmt::skip]
lazy_static! {
    static ref BUILTINS: HashMap<&'static str, Builtin> = {
	let mut m: HashMap<&'static str, Builtin> = HashMap::new();
	for b in Builtin::ALL {
	    m.insert(b.name(), *b);
	}
	m
    };
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::BigintSum,
        Builtin::BigintGte,
        Builtin::BigintGt,
        Builtin::BigintEq,
        Builtin::BigintAdd,
        Builtin::BigintSub,
        Builtin::Eq,
        Builtin::Len,
        Builtin::TypeOf,
        Builtin::IsBigintCoercible,
        Builtin::ObjectKeysSubset,
        Builtin::UniqueValues,
        Builtin::IsAfter,
        Builtin::IsBefore,
        Builtin::IsBetween,
        Builtin::IsStale,
        Builtin::IsWithin,
        Builtin::Now,
    ];

    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTINS.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::BigintSum => "bigint_sum",
            Builtin::BigintGte => "bigint_gte",
            Builtin::BigintGt => "bigint_gt",
            Builtin::BigintEq => "bigint_eq",
            Builtin::BigintAdd => "bigint_add",
            Builtin::BigintSub => "bigint_sub",
            Builtin::Eq => "eq",
            Builtin::Len => "len",
            Builtin::TypeOf => "type_of",
            Builtin::IsBigintCoercible => "is_bigint_coercible",
            Builtin::ObjectKeysSubset => "object_keys_subset",
            Builtin::UniqueValues => "unique_values",
            Builtin::IsAfter => "is_after",
            Builtin::IsBefore => "is_before",
            Builtin::IsBetween => "is_between",
            Builtin::IsStale => "is_stale",
            Builtin::IsWithin => "is_within",
            Builtin::Now => "now",
        }
    }

    /// Grammar major version that introduced this builtin.
    pub fn since_major(self) -> u32 {
        match self {
            Builtin::BigintSum | Builtin::BigintGte | Builtin::BigintGt => 1,
            _ => 2,
        }
    }

    pub fn arguments(self) -> Arguments {
        match self {
            Builtin::BigintSum => Arguments::Primaries { min: 1, max: 2 },
            Builtin::Now => Arguments::Exprs(0),
            Builtin::Len | Builtin::TypeOf | Builtin::IsBigintCoercible => Arguments::Exprs(1),
            Builtin::IsBetween | Builtin::IsStale | Builtin::IsWithin => Arguments::Exprs(3),
            _ => Arguments::Exprs(2),
        }
    }

    pub(crate) fn dispatch(self) -> Dispatch {
        match self {
            Builtin::BigintSum => Dispatch::Values(bigint::sum),
            Builtin::BigintGte => Dispatch::Values(bigint::gte),
            Builtin::BigintGt => Dispatch::Values(bigint::gt),
            Builtin::BigintEq => Dispatch::Values(bigint::eq),
            Builtin::BigintAdd => Dispatch::Values(bigint::add),
            Builtin::BigintSub => Dispatch::Values(bigint::sub),
            Builtin::Eq => Dispatch::Values(types::eq),
            Builtin::Len => Dispatch::Values(types::len),
            Builtin::TypeOf => Dispatch::Values(types::type_of),
            Builtin::IsBigintCoercible => Dispatch::Values(types::is_bigint_coercible),
            Builtin::ObjectKeysSubset => Dispatch::Values(types::object_keys_subset),
            Builtin::UniqueValues => Dispatch::Values(types::unique_values),
            Builtin::IsAfter => Dispatch::Values(time::is_after),
            Builtin::IsBefore => Dispatch::Values(time::is_before),
            Builtin::IsBetween => Dispatch::Values(time::is_between),
            Builtin::IsStale => Dispatch::Values(time::is_stale),
            Builtin::IsWithin => Dispatch::Values(time::is_within),
            Builtin::Now => Dispatch::Clock(time::now),
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` is parsed as a call rather than a field path.
pub fn is_callable(name: &str) -> bool {
    Builtin::from_name(name).is_some() || TemporalOp::from_name(name).is_some()
}

/// Names a schema field may not use: every builtin and temporal operator
/// plus the literal keywords.
pub fn reserved_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Builtin::ALL.iter().map(|b| b.name()).collect();
    names.extend(TemporalOp::ALL.iter().map(|op| op.name()));
    names.extend(["true", "false", "null"]);
    names
}
