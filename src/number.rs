// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use core::str::FromStr;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};
use serde::ser::Serializer;
use serde::Serialize;

use crate::*;

/// A JSON number. Integers are kept exact; decimals are `f64`.
#[derive(Clone)]
pub enum Number {
    UInt(u64),
    Int(i64),
    Float(f64),
    BigInt(Rc<BigInt>),
}

impl Number {
    pub fn from_bigint(value: BigInt) -> Self {
        if value.is_negative() {
            if let Some(i) = value.to_i64() {
                return Number::Int(i);
            }
        } else if let Some(u) = value.to_u64() {
            return Number::UInt(u);
        }

        Number::BigInt(Rc::new(value))
    }

    /// Exact integer value, if this number is integral.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Number::UInt(v) => Some(BigInt::from(*v)),
            Number::Int(v) => Some(BigInt::from(*v)),
            Number::BigInt(v) => Some((**v).clone()),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => BigInt::from_f64(*f),
            Number::Float(_) => None,
        }
    }

    pub fn to_f64_lossy(&self) -> f64 {
        match self {
            Number::UInt(v) => *v as f64,
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
            Number::BigInt(v) => match v.to_f64() {
                Some(f) => f,
                None if v.is_negative() => f64::NEG_INFINITY,
                None => f64::INFINITY,
            },
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => true,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::UInt(v) => *v == 0,
            Number::Int(v) => *v == 0,
            Number::Float(f) => *f == 0.0,
            Number::BigInt(v) => v.is_zero(),
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }

    pub fn format_decimal(&self) -> String {
        match self {
            Number::UInt(v) => v.to_string(),
            Number::Int(v) => v.to_string(),
            Number::BigInt(v) => v.to_string(),
            Number::Float(f) => {
                if f.is_nan() {
                    "NaN".to_string()
                } else {
                    f.to_string()
                }
            }
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::UInt(v) => serializer.serialize_u64(*v),
            Number::Int(v) => serializer.serialize_i64(*v),
            Number::Float(v) => serializer.serialize_f64(*v),
            Number::BigInt(v) => {
                let n = serde_json::Number::from_str(&v.to_string())
                    .map_err(|_| serde::ser::Error::custom("could not serialize number"))?;
                n.serialize(serializer)
            }
        }
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::from_bigint(value)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::UInt(value)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::UInt(value as u64)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseNumberError;

impl fmt::Display for ParseNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid number")
    }
}

impl std::error::Error for ParseNumberError {}

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseNumberError);
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        if !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit()) {
            if let Some(mut value) = BigInt::parse_bytes(digits.as_bytes(), 10) {
                if negative {
                    value = -value;
                }
                return Ok(Number::from_bigint(value));
            }
        }

        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
            .ok_or(ParseNumberError)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_integer() && other.is_integer() {
            if let (Some(a), Some(b)) = (self.to_bigint(), other.to_bigint()) {
                return Some(a.cmp(&b));
            }
        }

        self.to_f64_lossy().partial_cmp(&other.to_f64_lossy())
    }
}
