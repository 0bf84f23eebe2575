// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

#[cfg(feature = "arc")]
pub(crate) use std::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
pub(crate) use std::rc::Rc;

mod ast;
mod builtins;
mod constraint;
mod context;
mod engine;
mod error;
mod grammar;
mod interpreter;
mod lexer;
mod number;
mod parser;
mod registry;
mod type_checker;
mod value;
mod version;

pub use builtins::temporal::TemporalOp;
pub use builtins::{reserved_names, Builtin};
pub use constraint::{Constraint, ConstraintFile, ConstraintType, Severity, TypeSignature};
pub use context::{DataContext, PREVIOUS_KEY};
pub use engine::{Engine, EngineOptions, RecordReport, Violation};
pub use error::{ConstraintFileError, LexError, SyntaxError};
pub use grammar::{validate_expression, validate_expression_for_version, ValidationResult};
pub use interpreter::{evaluate, evaluate_with_version};
pub use lexer::tokenize;
pub use number::Number;
pub use parser::MAX_EXPRESSION_DEPTH;
pub use registry::{RegistryError, SchemaRegistry, SchemaRegistryEntry};
pub use type_checker::{type_check, TypeCheckError, TypeCheckResult, TypeCheckWarning};
pub use value::Value;
pub use version::{expression_version_supported, ExpressionVersion, EXPRESSION_VERSION};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
