// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::ConstraintFileError;
use crate::parser::{parse_expression, MAX_EXPRESSION_DEPTH};
use crate::version::ExpressionVersion;

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// Declared types of the values an expression reads.
///
/// Types are kept as written so that unknown spellings can be reported by
/// the type checker instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSignature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default)]
    pub field_types: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub expression: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_signature: Option<TypeSignature>,
}

/// A versioned set of constraints bound to one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintFile {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub schema_id: String,
    pub contract_version: String,
    pub expression_version: String,
    pub constraints: Vec<Constraint>,
}

impl ConstraintFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => bail!("Failed to read {path}. {e}"),
        }
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Grammar version the file's expressions are written against.
    pub fn version(&self) -> Result<ExpressionVersion, ConstraintFileError> {
        ExpressionVersion::parse_supported(&self.expression_version)
    }

    pub fn get(&self, id: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    /// Check file-level metadata and the syntax of every expression.
    /// All problems are reported; an empty list means the file is usable.
    pub fn validate(&self) -> Vec<ConstraintFileError> {
        let mut errors = vec![];

        let version = match self.version() {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if let Err(e) = semver::Version::parse(&self.contract_version) {
            errors.push(ConstraintFileError::InvalidContractVersion {
                version: self.contract_version.clone(),
                reason: e.to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        for c in &self.constraints {
            if !seen.insert(c.id.as_str()) {
                errors.push(ConstraintFileError::DuplicateConstraintId(c.id.clone()));
            }
        }

        if let Some(version) = version {
            for c in &self.constraints {
                let parsed = parse_expression(&c.expression, version, MAX_EXPRESSION_DEPTH);
                if let Err(error) = parsed {
                    errors.push(ConstraintFileError::InvalidExpression {
                        id: c.id.clone(),
                        error,
                    });
                }
            }
        }

        errors
    }
}

/// Type of an operand as written in a type signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintType {
    Boolean,
    Bigint,
    BigintCoercible,
    String,
    Number,
    Array,
    Object,
    Unknown,
    /// `T[]`
    ArrayOf(Box<ConstraintType>),
    /// `Record<K, V>`, treated as an object.
    Record(std::string::String),
    /// Upper-case leading name of another schema.
    SchemaRef(std::string::String),
}

impl ConstraintType {
    fn parse_base(s: &str) -> Option<Self> {
        Some(match s {
            "boolean" => ConstraintType::Boolean,
            "bigint" | "arbitrary_precision_integer" => ConstraintType::Bigint,
            "bigint_coercible" | "arbitrary_precision_integer_coercible" => {
                ConstraintType::BigintCoercible
            }
            "string" => ConstraintType::String,
            "number" => ConstraintType::Number,
            "array" => ConstraintType::Array,
            "object" => ConstraintType::Object,
            "unknown" => ConstraintType::Unknown,
            _ if s.starts_with("Record<") && s.ends_with('>') => {
                ConstraintType::Record(s["Record<".len()..s.len() - 1].to_string())
            }
            _ if s.starts_with(|c: char| c.is_ascii_uppercase()) => {
                ConstraintType::SchemaRef(s.to_string())
            }
            _ => return None,
        })
    }
}

impl FromStr for ConstraintType {
    type Err = std::string::String;

    /// Only one trailing `[]` is understood.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_suffix("[]") {
            Some(elem) => Self::parse_base(elem).map(|t| ConstraintType::ArrayOf(Box::new(t))),
            None => Self::parse_base(s),
        };
        parsed.ok_or_else(|| format!("`{s}` is not a constraint type"))
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Boolean => f.write_str("boolean"),
            ConstraintType::Bigint => f.write_str("bigint"),
            ConstraintType::BigintCoercible => f.write_str("bigint_coercible"),
            ConstraintType::String => f.write_str("string"),
            ConstraintType::Number => f.write_str("number"),
            ConstraintType::Array => f.write_str("array"),
            ConstraintType::Object => f.write_str("object"),
            ConstraintType::Unknown => f.write_str("unknown"),
            ConstraintType::ArrayOf(t) => write!(f, "{t}[]"),
            ConstraintType::Record(inner) => write!(f, "Record<{inner}>"),
            ConstraintType::SchemaRef(name) => f.write_str(name),
        }
    }
}
