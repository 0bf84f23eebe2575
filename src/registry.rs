// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use thiserror::Error;

/// Errors that can occur when registering schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("schema registration failed: a schema with the id '{0}' is already registered")]
    AlreadyExists(String),

    #[error("schema registration failed: the id '{0}' is invalid (empty or whitespace-only ids are not allowed)")]
    InvalidName(String),
}

/// Validates that a schema id is not empty or whitespace-only.
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        Err(RegistryError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// The field names a schema declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistryEntry {
    pub fields: BTreeSet<String>,
}

impl SchemaRegistryEntry {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }
}

/// Caller-owned map from schema id to the fields that schema declares.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaRegistryEntry>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Fails if the id is blank or already registered.
    pub fn register(
        &mut self,
        schema_id: impl Into<String>,
        entry: SchemaRegistryEntry,
    ) -> Result<(), RegistryError> {
        let schema_id = schema_id.into();
        validate_name(&schema_id)?;
        if self.schemas.contains_key(&schema_id) {
            return Err(RegistryError::AlreadyExists(schema_id));
        }
        self.schemas.insert(schema_id, entry);
        Ok(())
    }

    pub fn get(&self, schema_id: &str) -> Option<&SchemaRegistryEntry> {
        self.schemas.get(schema_id)
    }

    pub fn contains(&self, schema_id: &str) -> bool {
        self.schemas.contains_key(schema_id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Build a registry from JSON. Each member maps a schema id either to a
    /// list of field names or to a schema object whose `properties` keys are
    /// the field names.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let Value::Object(schemas) = Value::from_json_str(json)? else {
            bail!("schema registry must be a json object");
        };

        let mut registry = Self::new();
        for (id, schema) in schemas.iter() {
            let fields: Vec<String> = match schema {
                Value::Array(names) => {
                    let mut fields = vec![];
                    for n in names.iter() {
                        match n.as_str() {
                            Some(s) => fields.push(s.to_string()),
                            None => bail!("schema `{id}`: field names must be strings. Got `{n}`"),
                        }
                    }
                    fields
                }
                Value::Object(_) => match schema.get("properties") {
                    Some(Value::Object(props)) => props.keys().map(|k| k.to_string()).collect(),
                    None => vec![],
                    Some(other) => bail!("schema `{id}`: `properties` must be an object. Got `{other}`"),
                },
                _ => bail!("schema `{id}` must be a field list or a schema object"),
            };
            registry.register(id.as_ref(), SchemaRegistryEntry::new(fields))?;
        }
        Ok(registry)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => bail!("Failed to read {path}. {e}"),
        }
    }
}

impl FromIterator<(String, SchemaRegistryEntry)> for SchemaRegistry {
    fn from_iter<T: IntoIterator<Item = (String, SchemaRegistryEntry)>>(iter: T) -> Self {
        Self {
            schemas: iter.into_iter().collect(),
        }
    }
}
