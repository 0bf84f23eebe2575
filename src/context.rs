// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use anyhow::{bail, Result};

/// Reserved member of a data context holding the previous version of the record.
pub const PREVIOUS_KEY: &str = "_previous";

/// The record an expression is evaluated against, plus the optional
/// snapshot of the version that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContext {
    current: Value,
    previous: Option<Value>,
}

impl Default for DataContext {
    fn default() -> Self {
        Self {
            current: Value::new_object(),
            previous: None,
        }
    }
}

impl DataContext {
    /// Build a context from a record. An object stored under [`PREVIOUS_KEY`]
    /// becomes the previous snapshot and is removed from the current fields.
    pub fn new(record: Value) -> Self {
        let Value::Object(fields) = record else {
            return Self {
                current: record,
                previous: None,
            };
        };

        match fields.get(PREVIOUS_KEY) {
            Some(prev @ Value::Object(_)) => {
                let previous = prev.clone();
                let mut fields = fields.as_ref().clone();
                fields.remove(PREVIOUS_KEY);
                Self {
                    current: Value::from(fields),
                    previous: Some(previous),
                }
            }
            _ => Self {
                current: Value::Object(fields),
                previous: None,
            },
        }
    }

    /// Build a context from explicit current and previous records.
    pub fn with_previous(current: Value, previous: Value) -> Self {
        let mut ctx = Self::new(current);
        ctx.previous = match previous {
            Value::Object(_) => Some(previous),
            _ => None,
        };
        ctx
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let record = Value::from_json_str(json)?;
        if !matches!(record, Value::Object(_)) {
            bail!("data context must be a json object");
        }
        Ok(Self::new(record))
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => bail!("Failed to read {path}. {e}"),
        }
    }

    pub fn current(&self) -> &Value {
        &self.current
    }

    pub fn previous(&self) -> Option<&Value> {
        self.previous.as_ref()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Resolve a dotted path against the current record. A path rooted at
    /// [`PREVIOUS_KEY`] walks the previous snapshot instead.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        match segments.split_first() {
            Some((root, rest)) if root.as_ref() == PREVIOUS_KEY => {
                self.previous.as_ref()?.get_path(rest.iter())
            }
            _ => self.current.get_path(segments.iter()),
        }
    }

    /// Resolve a dotted path against the previous snapshot only.
    pub fn lookup_previous<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        self.previous.as_ref()?.get_path(segments.iter())
    }
}

impl From<Value> for DataContext {
    fn from(record: Value) -> Self {
        Self::new(record)
    }
}
