// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::{ensure_array, ensure_bigint, ensure_string};
use crate::interpreter::Operand;
use crate::value::Value;

use num_bigint::BigInt;
use num_traits::Zero;

fn add_term(fcn: &str, total: &mut BigInt, term: &Value) {
    if !term.is_null() {
        *total += ensure_bigint(fcn, &Operand::Value(term.clone()));
    }
}

/// `bigint_sum(values)` or `bigint_sum(records, 'field')`.
pub fn sum(args: &[Operand]) -> Operand {
    let fcn = "bigint_sum";
    let mut total = BigInt::zero();

    match args {
        [source] => match ensure_array(source) {
            Some(items) => items.iter().for_each(|v| add_term(fcn, &mut total, v)),
            None => log::debug!("`{fcn}` expects an array. Got `{source}` instead"),
        },
        [source, field] => match (ensure_array(source), ensure_string(field)) {
            (Some(items), Some(field)) => {
                let segments: Vec<&str> = field.split('.').collect();
                for item in items.iter().filter(|v| matches!(v, Value::Object(_))) {
                    if let Some(term) = item.get_path(segments.iter()) {
                        add_term(fcn, &mut total, term);
                    }
                }
            }
            _ => log::debug!("`{fcn}` expects an array and a field name"),
        },
        _ => (),
    }

    Operand::Integer(total)
}

fn binary(fcn: &str, args: &[Operand]) -> (BigInt, BigInt) {
    match args {
        [a, b] => (ensure_bigint(fcn, a), ensure_bigint(fcn, b)),
        _ => (BigInt::zero(), BigInt::zero()),
    }
}

pub fn gte(args: &[Operand]) -> Operand {
    let (a, b) = binary("bigint_gte", args);
    Operand::from(a >= b)
}

pub fn gt(args: &[Operand]) -> Operand {
    let (a, b) = binary("bigint_gt", args);
    Operand::from(a > b)
}

pub fn eq(args: &[Operand]) -> Operand {
    let (a, b) = binary("bigint_eq", args);
    Operand::from(a == b)
}

pub fn add(args: &[Operand]) -> Operand {
    let (a, b) = binary("bigint_add", args);
    Operand::Value(Value::from((a + b).to_string()))
}

pub fn sub(args: &[Operand]) -> Operand {
    let (a, b) = binary("bigint_sub", args);
    Operand::Value(Value::from((a - b).to_string()))
}
