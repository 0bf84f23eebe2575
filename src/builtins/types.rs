// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::comparison::operands_equal;
use crate::builtins::utils::{ensure_array, ensure_string, is_integer_like, string_length};
use crate::interpreter::Operand;
use crate::value::Value;

pub fn eq(args: &[Operand]) -> Operand {
    match args {
        [a, b] => Operand::from(operands_equal(a, b)),
        _ => Operand::from(false),
    }
}

/// Length shared by `len(...)` and the `.length` accessor. Objects only
/// have a length through `len`.
pub fn length_of(v: &Operand, count_keys: bool) -> usize {
    match v {
        Operand::Value(Value::Array(a)) => a.len(),
        Operand::Value(Value::String(s)) => string_length(s),
        Operand::Value(Value::Object(o)) if count_keys => o.len(),
        _ => 0,
    }
}

pub fn len(args: &[Operand]) -> Operand {
    let n = args.first().map(|v| length_of(v, true)).unwrap_or(0);
    Operand::Value(Value::from(n))
}

pub fn type_of(args: &[Operand]) -> Operand {
    let kind = match args.first() {
        None | Some(Operand::Undefined) => "undefined",
        Some(Operand::Integer(_)) => "bigint",
        Some(Operand::Value(v)) => v.kind(),
    };
    Operand::Value(Value::from(kind))
}

pub fn is_bigint_coercible(args: &[Operand]) -> Operand {
    Operand::from(args.first().map(is_integer_like).unwrap_or(false))
}

/// Every key of the record is one of the allowed names.
pub fn object_keys_subset(args: &[Operand]) -> Operand {
    let [record, allowed] = args else {
        return Operand::from(false);
    };
    let Some(allowed) = ensure_array(allowed) else {
        return Operand::from(false);
    };

    let result = match record {
        Operand::Value(Value::Object(fields)) => fields.keys().all(|k| {
            allowed
                .iter()
                .any(|a| matches!(a, Value::String(s) if s.as_ref() == k.as_ref()))
        }),
        r if r.is_nullish() => true,
        _ => false,
    };
    Operand::from(result)
}

/// `unique_values(records, 'field')`: no two records share a value at the
/// (possibly dotted) field. Records lacking the field are ignored.
pub fn unique_values(args: &[Operand]) -> Operand {
    let [records, field] = args else {
        return Operand::from(false);
    };
    let (Some(records), Some(field)) = (ensure_array(records), ensure_string(field)) else {
        log::debug!("`unique_values` expects an array and a field name");
        return Operand::from(false);
    };

    let segments: Vec<&str> = field.split('.').collect();
    let mut seen: Vec<&Value> = vec![];
    for v in records.iter().filter_map(|r| r.get_path(segments.iter())) {
        if seen.contains(&v) {
            return Operand::from(false);
        }
        seen.push(v);
    }
    Operand::from(true)
}
