// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Error produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LexError {
    pub message: String,
    /// Byte offset into the expression source.
    pub offset: u32,
}

impl LexError {
    pub fn new(message: impl Into<String>, offset: u32) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Error produced while parsing an expression, including lexical errors and
/// nesting-depth overflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the expression source.
    pub offset: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: u32) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Render the error against its source with a caret under the offending column.
    pub fn render(&self, source: &str, file: &str) -> String {
        let offset = (self.offset as usize).min(source.len());
        let before = &source[..floor_char_boundary(source, offset)];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let col = before[line_start..].chars().count() + 1;
        let line_text = source[line_start..].split('\n').next().unwrap_or("");

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col - 1;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
             {:<line_num_width$}| {}\n\
             {:<line_num_width$}| {:<col_spaces$}^\n\
             error: {}",
            file, line, col, "", line, line_text, "", "", self.message
        )
    }
}

impl From<LexError> for SyntaxError {
    fn from(e: LexError) -> Self {
        Self {
            message: e.message,
            offset: e.offset,
        }
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Problems with the file-level metadata of a constraint file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintFileError {
    #[error("expression_version `{0}` must match `<major>.<minor>`")]
    MalformedExpressionVersion(String),

    #[error("expression_version `{0}` is not supported by this evaluator")]
    UnsupportedExpressionVersion(String),

    #[error("contract_version `{version}` is not valid semver: {reason}")]
    InvalidContractVersion { version: String, reason: String },

    #[error("constraint id `{0}` is declared more than once")]
    DuplicateConstraintId(String),

    #[error("constraint `{id}`: {error}")]
    InvalidExpression { id: String, error: SyntaxError },
}
