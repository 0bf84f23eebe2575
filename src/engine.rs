// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::builtins::time::parse_timestamp;
use crate::constraint::{Constraint, ConstraintFile, Severity};
use crate::context::DataContext;
use crate::error::SyntaxError;
use crate::grammar::ValidationResult;
use crate::interpreter::Interpreter;
use crate::parser::{parse_expression, MAX_EXPRESSION_DEPTH};
use crate::registry::SchemaRegistry;
use crate::type_checker::{type_check, TypeCheckResult};
use crate::version::{ExpressionVersion, EXPRESSION_VERSION};
use crate::*;

use anyhow::{anyhow, bail, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Settings that control how an [`Engine`] parses and judges expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Grammar used by [`Engine::evaluate`] and [`Engine::validate`].
    /// Constraints from a loaded file use the file's own version.
    pub expression_version: String,
    /// Nesting bound. Values above [`MAX_EXPRESSION_DEPTH`] are capped.
    pub max_depth: u32,
    pub fail_on_warning_violations: bool,
    /// ISO-8601 time that `now()` reports, for replaying time-dependent
    /// constraints. The system clock is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_timestamp: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            expression_version: EXPRESSION_VERSION.to_string(),
            max_depth: MAX_EXPRESSION_DEPTH,
            fail_on_warning_violations: false,
            evaluation_timestamp: None,
        }
    }
}

impl EngineOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => bail!("Failed to read {path}. {e}"),
        }
    }
}

/// A violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub id: String,
    pub severity: Severity,
    pub message: String,
}

/// Outcome of checking one record against every loaded constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

// A constraint together with its parsed expression.
#[derive(Debug)]
struct Compiled {
    constraint: Constraint,
    expr: ExprRef,
}

#[derive(Debug)]
struct Loaded {
    file: ConstraintFile,
    compiled: Vec<Compiled>,
}

/// The constraint evaluation engine.
///
/// An engine holds at most one constraint file. All of the file's
/// expressions are parsed when it is loaded, so checking a record never
/// encounters a syntax error.
#[derive(Debug, Clone)]
pub struct Engine {
    options: EngineOptions,
    version: ExpressionVersion,
    max_depth: u32,
    loaded: Option<Rc<Loaded>>,
}

/// Create a default engine.
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            options: EngineOptions::default(),
            version: ExpressionVersion::LATEST,
            max_depth: MAX_EXPRESSION_DEPTH,
            loaded: None,
        }
    }

    /// Create an engine with the given options.
    ///
    /// Fails if `expression_version` is malformed or not supported.
    pub fn with_options(options: EngineOptions) -> Result<Self> {
        let version = ExpressionVersion::parse_supported(&options.expression_version)?;
        let max_depth = options.max_depth.min(MAX_EXPRESSION_DEPTH);
        if let Some(ts) = &options.evaluation_timestamp {
            if parse_timestamp(ts).is_none() {
                warn!("evaluation_timestamp `{ts}` is not ISO-8601; using the system clock");
            }
        }
        Ok(Self {
            options,
            version,
            max_depth,
            loaded: None,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Load a constraint file. Fails if a file is already loaded; use
    /// [`Engine::replace_constraint_file`] to swap it.
    ///
    /// ```
    /// # use crossfield::*;
    /// # fn main() -> anyhow::Result<()> {
    /// let mut engine = Engine::new();
    /// engine.set_constraint_file(ConstraintFile::from_json_str(r#"{
    ///     "schema_id": "Escrow",
    ///     "contract_version": "1.0.0",
    ///     "expression_version": "2.0",
    ///     "constraints": [{
    ///         "id": "released-has-timestamp",
    ///         "expression": "state == 'released' => released_at != null",
    ///         "severity": "error",
    ///         "message": "released escrow needs released_at"
    ///     }]
    /// }"#)?)?;
    ///
    /// let record = DataContext::from_json_str(r#"{"state": "released"}"#)?;
    /// assert!(!engine.check_record(&record)?.passed);
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_constraint_file(&mut self, file: ConstraintFile) -> Result<()> {
        if let Some(loaded) = &self.loaded {
            bail!(
                "constraint file for `{}` is already loaded",
                loaded.file.schema_id
            );
        }
        let loaded = self.compile(file)?;
        info!(
            "loaded {} constraint(s) for schema `{}`",
            loaded.compiled.len(),
            loaded.file.schema_id
        );
        self.loaded = Some(Rc::new(loaded));
        Ok(())
    }

    pub fn set_constraint_file_from_json_file(&mut self, path: &str) -> Result<()> {
        self.set_constraint_file(ConstraintFile::from_json_file(path)?)
    }

    /// Swap in a new constraint file.
    ///
    /// The new file is validated and parsed in full before anything changes;
    /// on failure the previously loaded file stays in effect.
    pub fn replace_constraint_file(&mut self, file: ConstraintFile) -> Result<()> {
        let loaded = self.compile(file)?;
        match &self.loaded {
            Some(old) => info!(
                "replaced constraint file for `{}` (contract {} -> {})",
                loaded.file.schema_id, old.file.contract_version, loaded.file.contract_version
            ),
            None => info!(
                "loaded {} constraint(s) for schema `{}`",
                loaded.compiled.len(),
                loaded.file.schema_id
            ),
        }
        self.loaded = Some(Rc::new(loaded));
        Ok(())
    }

    pub fn constraint_file(&self) -> Option<&ConstraintFile> {
        self.loaded.as_ref().map(|l| &l.file)
    }

    fn compile(&self, file: ConstraintFile) -> Result<Loaded> {
        let errors = file.validate();
        if !errors.is_empty() {
            let list = errors
                .iter()
                .map(|e| format!("  {e}"))
                .collect::<Vec<_>>()
                .join("\n");
            bail!("invalid constraint file for `{}`:\n{list}", file.schema_id);
        }

        let version = file.version()?;
        let mut compiled = Vec::with_capacity(file.constraints.len());
        for c in &file.constraints {
            let expr = parse_expression(&c.expression, version, self.max_depth)
                .map_err(|e| anyhow!("constraint `{}`: {}", c.id, e.render(&c.expression, &c.id)))?;
            compiled.push(Compiled {
                constraint: c.clone(),
                expr,
            });
        }
        Ok(Loaded { file, compiled })
    }

    /// Evaluate an ad-hoc expression under the engine's grammar version.
    pub fn evaluate(&self, expr: &str, data: &DataContext) -> Result<bool, SyntaxError> {
        let parsed = parse_expression(expr, self.version, self.max_depth)?;
        Ok(self.interpreter(data).eval_bool(&parsed))
    }

    /// Check an expression's syntax under the engine's grammar version.
    pub fn validate(&self, expr: &str) -> ValidationResult {
        match parse_expression(expr, self.version, self.max_depth) {
            Ok(_) => ValidationResult::ok(),
            Err(e) => e.into(),
        }
    }

    /// Evaluate a single loaded constraint.
    pub fn eval_constraint(&self, id: &str, data: &DataContext) -> Result<bool> {
        let loaded = self.loaded()?;
        match loaded.compiled.iter().find(|c| c.constraint.id == id) {
            Some(c) => Ok(self.interpreter(data).eval_bool(&c.expr)),
            None => bail!("constraint `{id}` is not defined in the loaded file"),
        }
    }

    /// Evaluate every loaded constraint against `data`.
    ///
    /// The record passes when no `error` constraint is violated, or when no
    /// constraint at all is violated if `fail_on_warning_violations` is set.
    pub fn check_record(&self, data: &DataContext) -> Result<RecordReport> {
        let loaded = self.loaded()?;
        let mut violations = vec![];
        for c in &loaded.compiled {
            if self.interpreter(data).eval_bool(&c.expr) {
                continue;
            }
            if c.constraint.severity == Severity::Error {
                warn!("constraint `{}` violated: {}", c.constraint.id, c.constraint.message);
            }
            violations.push(Violation {
                id: c.constraint.id.clone(),
                severity: c.constraint.severity,
                message: c.constraint.message.clone(),
            });
        }

        let passed = violations.iter().all(|v| {
            v.severity == Severity::Warning && !self.options.fail_on_warning_violations
        });
        Ok(RecordReport { passed, violations })
    }

    /// Type-check the loaded file against `registry`.
    pub fn type_check(&self, registry: &SchemaRegistry) -> Result<TypeCheckResult> {
        Ok(type_check(&self.loaded()?.file, registry))
    }

    fn interpreter<'a>(&self, data: &'a DataContext) -> Interpreter<'a> {
        Interpreter::new(data)
            .with_evaluation_timestamp(self.options.evaluation_timestamp.as_deref())
    }

    fn loaded(&self) -> Result<&Loaded> {
        match &self.loaded {
            Some(l) => Ok(l.as_ref()),
            None => bail!("no constraint file loaded"),
        }
    }
}
