// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::constraint::{ConstraintFile, ConstraintType};
use crate::registry::SchemaRegistry;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCheckError {
    pub constraint_id: String,
    pub expression_fragment: String,
    pub expected_type: String,
    pub actual_type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCheckWarning {
    pub constraint_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCheckResult {
    pub valid: bool,
    pub errors: Vec<TypeCheckError>,
    pub warnings: Vec<TypeCheckWarning>,
}

impl TypeCheckResult {
    fn error(
        &mut self,
        constraint_id: &str,
        fragment: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: String,
    ) {
        self.errors.push(TypeCheckError {
            constraint_id: constraint_id.to_string(),
            expression_fragment: fragment.into(),
            expected_type: expected.into(),
            actual_type: actual.into(),
            message,
        });
    }

    fn warning(&mut self, constraint_id: &str, message: String) {
        self.warnings.push(TypeCheckWarning {
            constraint_id: constraint_id.to_string(),
            message,
        });
    }
}

/// Cross-check the type signatures declared in `file` against the fields
/// `registry` knows for the file's schema.
///
/// Findings are accumulated; a missing schema does not stop the
/// per-constraint checks that do not need it.
pub fn type_check(file: &ConstraintFile, registry: &SchemaRegistry) -> TypeCheckResult {
    let mut result = TypeCheckResult::default();
    let schema_id = file.schema_id.as_str();

    let entry = registry.get(schema_id);
    if entry.is_none() {
        result.error(
            schema_id,
            schema_id,
            "registered schema",
            "unknown",
            format!("Schema '{schema_id}' not found in registry"),
        );
    }

    for c in &file.constraints {
        let Some(sig) = &c.type_signature else {
            result.warning(
                &c.id,
                format!("Constraint '{}' has no type_signature: cannot type-check", c.id),
            );
            continue;
        };

        // Blank entries count as absent.
        if let Some(input) = sig.input_schema.as_deref().filter(|s| !s.is_empty()) {
            if input != schema_id {
                result.error(
                    &c.id,
                    input,
                    schema_id,
                    input,
                    format!(
                        "type_signature.input_schema '{input}' does not match file schema_id '{schema_id}'"
                    ),
                );
            }
        }

        if let Some(output) = sig.output_type.as_deref().filter(|s| !s.is_empty()) {
            if output != "boolean" {
                result.error(
                    &c.id,
                    format!("output_type: {output}"),
                    "boolean",
                    output,
                    format!("Constraint output_type must be 'boolean', got '{output}'"),
                );
            }
        }

        for (path, ty) in &sig.field_types {
            if ty.parse::<ConstraintType>().is_err() {
                result.warning(
                    &c.id,
                    format!(
                        "Field '{path}' has type '{ty}': not a primitive ConstraintType (may be a schema reference)"
                    ),
                );
            }

            let Some(entry) = entry.filter(|e| !e.fields.is_empty()) else {
                continue;
            };
            let root = path.split('.').next().unwrap_or_default();
            if !entry.has_field(root) {
                result.warning(
                    &c.id,
                    format!("Field path '{path}' root '{root}' not found in schema '{schema_id}' fields"),
                );
            }
        }
    }

    result.valid = result.errors.is_empty();
    result
}
