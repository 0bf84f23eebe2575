// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::SyntaxError;
use crate::parser::{parse_expression, MAX_EXPRESSION_DEPTH};
use crate::version::ExpressionVersion;

use serde::Serialize;

/// Outcome of checking an expression's syntax without evaluating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl ValidationResult {
    pub(crate) fn ok() -> Self {
        Self {
            valid: true,
            error: None,
            position: None,
        }
    }
}

impl From<SyntaxError> for ValidationResult {
    fn from(e: SyntaxError) -> Self {
        Self {
            valid: false,
            error: Some(e.message),
            position: Some(e.offset),
        }
    }
}

/// Check `expr` against the latest grammar. Never fails; problems are
/// reported in the result.
pub fn validate_expression(expr: &str) -> ValidationResult {
    validate_expression_for_version(expr, ExpressionVersion::LATEST)
}

/// Check `expr` against the grammar of a specific `expression_version`.
pub fn validate_expression_for_version(
    expr: &str,
    version: ExpressionVersion,
) -> ValidationResult {
    match parse_expression(expr, version, MAX_EXPRESSION_DEPTH) {
        Ok(_) => ValidationResult::ok(),
        Err(e) => e.into(),
    }
}
