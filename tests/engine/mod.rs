// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use crossfield::*;

const DIVIDENDS: &str = r#"{
    "$schema": "https://example.org/constraint-file.schema.json",
    "schema_id": "Dividend",
    "contract_version": "3.1.0",
    "expression_version": "2.0",
    "constraints": [
        {
            "id": "mixed-needs-split",
            "expression": "target == 'mixed' => split != null && split.length > 0",
            "severity": "error",
            "message": "a mixed-target dividend must declare a split",
            "fields": ["target", "split"],
            "type_signature": {
                "input_schema": "Dividend",
                "output_type": "boolean",
                "field_types": {"target": "string", "split": "SplitEntry[]"}
            }
        },
        {
            "id": "split-shares-conserved",
            "expression": "split == null || bigint_sum(split, 'share') == total",
            "severity": "error",
            "message": "split shares must add up to the total",
            "fields": ["split", "total"]
        },
        {
            "id": "total-only-grows",
            "expression": "delta(total) >= 0",
            "severity": "warning",
            "message": "total decreased",
            "fields": ["total"]
        }
    ]
}"#;

fn engine() -> Result<Engine> {
    let mut engine = Engine::new();
    engine.set_constraint_file(ConstraintFile::from_json_str(DIVIDENDS)?)?;
    Ok(engine)
}

fn ids(report: &RecordReport) -> Vec<&str> {
    report.violations.iter().map(|v| v.id.as_str()).collect()
}

#[test]
fn check_record_reports_violations() -> Result<()> {
    let engine = engine()?;

    let ok = DataContext::from_json_str(
        r#"{"target": "mixed", "total": "100",
            "split": [{"to": "holders", "share": "60"}, {"to": "treasury", "share": "40"}]}"#,
    )?;
    let report = engine.check_record(&ok)?;
    assert!(report.passed);
    assert!(report.violations.is_empty());

    let missing_split = DataContext::from_json_str(r#"{"target": "mixed", "total": "100"}"#)?;
    let report = engine.check_record(&missing_split)?;
    assert!(!report.passed);
    assert_eq!(ids(&report), ["mixed-needs-split"]);
    assert_eq!(report.violations[0].severity, Severity::Error);
    assert_eq!(
        report.violations[0].message,
        "a mixed-target dividend must declare a split"
    );

    let shrinking = DataContext::from_json_str(
        r#"{"target": "cash", "total": "90", "_previous": {"total": "100"}}"#,
    )?;
    let report = engine.check_record(&shrinking)?;
    assert!(report.passed);
    assert_eq!(ids(&report), ["total-only-grows"]);
    Ok(())
}

#[test]
fn eval_single_constraint() -> Result<()> {
    let engine = engine()?;
    let ctx = DataContext::from_json_str(
        r#"{"total": "10", "split": [{"share": "4"}, {"share": "5"}]}"#,
    )?;
    assert!(!engine.eval_constraint("split-shares-conserved", &ctx)?);
    assert!(engine.eval_constraint("mixed-needs-split", &ctx)?);
    assert!(engine.eval_constraint("no-such-constraint", &ctx).is_err());
    Ok(())
}

#[test]
fn invalid_files_are_rejected() -> Result<()> {
    let mut f = ConstraintFile::from_json_str(DIVIDENDS)?;
    f.constraints[1].expression = "split == null ||".to_string();
    f.constraints[2].id = f.constraints[0].id.clone();

    let mut engine = Engine::new();
    let err = engine.set_constraint_file(f).unwrap_err().to_string();
    assert!(err.contains("invalid constraint file for `Dividend`"), "{err}");
    assert!(err.contains("declared more than once"), "{err}");
    assert!(err.contains("split-shares-conserved"), "{err}");
    assert!(engine.constraint_file().is_none());
    assert!(engine.check_record(&DataContext::default()).is_err());
    Ok(())
}

#[test]
fn replace_swaps_the_whole_file() -> Result<()> {
    let mut engine = engine()?;
    assert!(engine
        .set_constraint_file(ConstraintFile::from_json_str(DIVIDENDS)?)
        .is_err());

    let mut next = ConstraintFile::from_json_str(DIVIDENDS)?;
    next.contract_version = "3.2.0".to_string();
    next.constraints.truncate(1);
    engine.replace_constraint_file(next)?;

    let ctx = DataContext::from_json_str(r#"{"target": "cash", "total": "1", "split": [{"share": "9"}]}"#)?;
    let report = engine.check_record(&ctx)?;
    assert!(report.passed, "{report:?}");
    assert_eq!(
        engine.constraint_file().map(|f| f.contract_version.as_str()),
        Some("3.2.0")
    );
    Ok(())
}

#[test]
fn tighter_depth_applies_to_loaded_files() -> Result<()> {
    let mut engine = Engine::with_options(EngineOptions {
        max_depth: 1,
        ..Default::default()
    })?;
    // Every builtin argument opens a level, so nested calls no longer fit.
    let mut f = ConstraintFile::from_json_str(DIVIDENDS)?;
    f.constraints[2].expression = "bigint_gte(bigint_sum([total]), 0)".to_string();
    assert!(engine.set_constraint_file(f).is_err());

    assert!(engine.evaluate("bigint_gte(total, 0)", &DataContext::default())?);
    assert!(engine
        .evaluate("bigint_gte((total), 0)", &DataContext::default())
        .is_err());
    Ok(())
}

#[test]
fn options_from_json() -> Result<()> {
    let options = EngineOptions::from_json_str(r#"{"fail_on_warning_violations": true}"#)?;
    assert_eq!(options.expression_version, EXPRESSION_VERSION);
    assert_eq!(options.max_depth, MAX_EXPRESSION_DEPTH);
    assert!(options.fail_on_warning_violations);

    assert!(EngineOptions::from_json_str(r#"{"max_dept": 3}"#).is_err());

    let engine = Engine::with_options(EngineOptions::from_json_str(r#"{"max_depth": 1000}"#)?)?;
    let deep = format!("{}a{}", "(".repeat(32), ")".repeat(32));
    assert!(engine.validate(&deep).valid);
    Ok(())
}

#[test]
fn type_check_loaded_file() -> Result<()> {
    let engine = engine()?;
    let mut registry = SchemaRegistry::new();
    registry.register("Dividend", SchemaRegistryEntry::new(["target", "split", "total"]))?;
    let r = engine.type_check(&registry)?;
    assert!(r.valid);
    // Two constraints carry no signature.
    assert_eq!(r.warnings.len(), 2);
    Ok(())
}
