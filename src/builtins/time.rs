// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::ensure_string;
use crate::interpreter::Operand;
use crate::value::Value;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use num_traits::ToPrimitive;

/// Parse an ISO-8601 timestamp: RFC 3339 date-time with an offset, or a
/// bare `YYYY-MM-DD` date taken as midnight UTC. Other formats are
/// rejected even when a looser parser would accept them.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if text.len() == 10 {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    None
}

/// Format the way `now()` reports time: UTC with millisecond precision.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp(fcn: &str, v: &Operand) -> Option<DateTime<Utc>> {
    let parsed = ensure_string(v).and_then(parse_timestamp);
    if parsed.is_none() {
        log::debug!("`{fcn}` could not read `{v}` as an ISO-8601 timestamp");
    }
    parsed
}

// Seconds as a non-negative finite number.
fn max_age(fcn: &str, v: &Operand) -> Option<f64> {
    let secs = match v {
        Operand::Integer(i) => i.to_f64(),
        Operand::Value(Value::Number(n)) => Some(n.to_f64_lossy()),
        Operand::Value(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match secs {
        Some(s) if s.is_finite() && s >= 0.0 => Some(s),
        _ => {
            log::debug!("`{fcn}` expects a non-negative number of seconds. Got `{v}`");
            None
        }
    }
}

fn pair(fcn: &str, args: &[Operand]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match args {
        [a, b] => Some((timestamp(fcn, a)?, timestamp(fcn, b)?)),
        _ => None,
    }
}

pub fn is_after(args: &[Operand]) -> Operand {
    Operand::from(pair("is_after", args).is_some_and(|(a, b)| a > b))
}

pub fn is_before(args: &[Operand]) -> Operand {
    Operand::from(pair("is_before", args).is_some_and(|(a, b)| a < b))
}

/// Inclusive at both ends.
pub fn is_between(args: &[Operand]) -> Operand {
    let fcn = "is_between";
    let result = match args {
        [v, lo, hi] => match (timestamp(fcn, v), timestamp(fcn, lo), timestamp(fcn, hi)) {
            (Some(v), Some(lo), Some(hi)) => lo <= v && v <= hi,
            _ => false,
        },
        _ => false,
    };
    Operand::from(result)
}

// Seconds from `ts` to `reference`, and the allowed age.
fn age(fcn: &str, args: &[Operand]) -> Option<(f64, f64)> {
    let [ts, limit, reference] = args else {
        return None;
    };
    let ts = timestamp(fcn, ts)?;
    let limit = max_age(fcn, limit)?;
    let reference = timestamp(fcn, reference)?;
    let elapsed = reference.signed_duration_since(ts).num_milliseconds() as f64 / 1000.0;
    Some((elapsed, limit))
}

/// `is_stale(ts, max_age_seconds, reference)`: more than `max_age` seconds
/// elapsed between `ts` and `reference`.
pub fn is_stale(args: &[Operand]) -> Operand {
    Operand::from(age("is_stale", args).is_some_and(|(elapsed, limit)| elapsed > limit))
}

/// Complement of [`is_stale`] for well-formed arguments.
pub fn is_within(args: &[Operand]) -> Operand {
    Operand::from(age("is_within", args).is_some_and(|(elapsed, limit)| elapsed <= limit))
}

pub fn now(_args: &[Operand], at: &DateTime<Utc>) -> Operand {
    Operand::Value(Value::from(format_timestamp(at)))
}
