// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use crossfield::*;
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Deserialize, Debug)]
struct TestCase {
    note: String,
    expression: String,
    data: Option<Value>,
    previous: Option<Value>,
    expression_version: Option<String>,
    evaluation_timestamp: Option<String>,
    want_result: Option<bool>,
    want_error: Option<String>,
    skip: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn context(case: &TestCase) -> DataContext {
    let data = case.data.clone().unwrap_or_else(Value::new_object);
    match &case.previous {
        Some(previous) => DataContext::with_previous(data, previous.clone()),
        None => DataContext::new(data),
    }
}

fn yaml_test_impl(file: &str) -> Result<()> {
    // RUST_LOG=debug shows coercions and skipped quantifiers per case.
    let _ = env_logger::builder().is_test(true).try_init();

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::eprintln!("running {file}");

    for case in test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }

        let version = match &case.expression_version {
            Some(v) => v.parse::<ExpressionVersion>()?,
            None => ExpressionVersion::LATEST,
        };
        let ctx = context(&case);
        let r = evaluate_with_version(
            &case.expression,
            &ctx,
            version,
            case.evaluation_timestamp.as_deref(),
        );

        match (&case.want_result, &case.want_error, r) {
            (Some(expected), _, Ok(actual)) => {
                if *expected != actual {
                    bail!(
                        "case `{}`: `{}` evaluated to {actual}, want {expected}",
                        case.note,
                        case.expression
                    );
                }
            }
            (_, Some(expected), Err(actual)) => {
                if !actual.to_string().contains(expected.as_str()) {
                    bail!("case `{}`: `{actual}` does not contain `{expected}`", case.note);
                }
                // The validator must report the same problem without failing.
                let v = validate_expression_for_version(&case.expression, version);
                if v.valid || v.position != Some(actual.offset) {
                    bail!("case `{}`: validator disagrees: {v:?}", case.note);
                }
            }
            (want_result, want_error, actual) => {
                bail!(
                    "case `{}`: want_result = `{want_result:?}` want_error = `{want_error:?}` actual = {actual:?}",
                    case.note
                );
            }
        }

        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e}");
        }
    }
}

#[test_resources("tests/evaluator/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    if file.is_empty() {
        bail!("missing yaml test file");
    }

    yaml_test(file.as_str())
}

fn nested_parens(depth: usize) -> String {
    format!("{}true{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn depth_boundary() -> Result<()> {
    let ctx = DataContext::default();
    assert!(evaluate(&nested_parens(MAX_EXPRESSION_DEPTH as usize), &ctx)?);

    let err = evaluate(&nested_parens(MAX_EXPRESSION_DEPTH as usize + 1), &ctx).unwrap_err();
    assert_eq!(err.message, "expression nesting exceeds maximum depth");
    assert_eq!(err.offset, MAX_EXPRESSION_DEPTH);
    Ok(())
}

#[test]
fn depth_counts_quantifier_bodies_and_arguments() -> Result<()> {
    // Each `.every` body opens one level.
    let mut expr = "true".to_string();
    for i in 0..MAX_EXPRESSION_DEPTH {
        expr = format!("v{i}.every(x{i} => {expr})");
    }
    assert!(validate_expression(&expr).valid);
    let deeper = format!("outer.every(o => {expr})");
    let r = validate_expression(&deeper);
    assert!(!r.valid);
    assert_eq!(
        r.error.as_deref(),
        Some("expression nesting exceeds maximum depth")
    );

    // So does every builtin argument.
    let mut expr = "a".to_string();
    for _ in 0..MAX_EXPRESSION_DEPTH + 1 {
        expr = format!("bigint_gte({expr}, 0)");
    }
    assert!(!validate_expression(&expr).valid);
    Ok(())
}

#[test]
fn long_negation_chain() -> Result<()> {
    let ctx = DataContext::from_json_str(r#"{"a": true}"#)?;
    let even = format!("{}a", "!".repeat(10_000));
    let odd = format!("{}a", "!".repeat(10_001));
    assert!(evaluate(&even, &ctx)?);
    assert!(!evaluate(&odd, &ctx)?);
    Ok(())
}

#[test]
fn implication_ignores_consequent_when_antecedent_false() -> Result<()> {
    let ctx = DataContext::from_json_str(r#"{"enabled": false}"#)?;
    for consequent in [
        "false",
        "missing.deep.path == 1",
        "bigint_gt(absent, 10)",
        "items.every(x => x.ok)",
        "changed(nothing)",
    ] {
        let expr = format!("enabled => {consequent}");
        assert!(evaluate(&expr, &ctx)?, "{expr}");
    }
    Ok(())
}

#[test]
fn temporal_operators_without_history() -> Result<()> {
    let ctx = DataContext::from_json_str(r#"{"state": "open", "balance": "10", "n": 3}"#)?;
    for f in ["state", "balance", "n", "missing", "a.b.c"] {
        assert!(!evaluate(&format!("changed({f})"), &ctx)?, "changed({f})");
        assert!(evaluate(&format!("delta({f}) == 0"), &ctx)?, "delta({f})");
        assert!(evaluate(&format!("previous({f}) == null"), &ctx)?, "previous({f})");
    }
    Ok(())
}

#[test]
fn graceful_arithmetic() -> Result<()> {
    let ctx = DataContext::from_json_str(r#"{"a": "not a number", "b": "7"}"#)?;
    assert!(!evaluate("bigint_sum([a, b]) == 12", &ctx)?);
    assert!(evaluate("bigint_sum([a, b]) == 7", &ctx)?);
    assert!(evaluate("bigint_gte(a, 0) && !bigint_gt(a, 0)", &ctx)?);
    Ok(())
}

#[test]
fn evaluation_is_deterministic() -> Result<()> {
    let ctx = DataContext::from_json_str(
        r#"{"items": [{"amount": "5"}, {"amount": "x"}], "total": "5", "_previous": {"total": "4"}}"#,
    )?;
    let expr = "bigint_sum(items, 'amount') == total && delta(total) == 1 && changed(total)";
    let first = evaluate(expr, &ctx)?;
    for _ in 0..100 {
        assert_eq!(evaluate(expr, &ctx)?, first);
    }
    assert!(first);
    Ok(())
}

// The escrow rules as a hand-written record validator would state them.
fn escrow_is_valid(record: &serde_json::Value) -> bool {
    let state = record.get("state").and_then(|s| s.as_str());
    let has = |k: &str| record.get(k).map(|v| !v.is_null()).unwrap_or(false);
    let released_ok = state != Some("released") || has("released_at");
    let refunded_ok = state != Some("refunded") || has("refunded_at");
    let amount_ok = record
        .get("amount")
        .and_then(|a| a.as_str())
        .map(|a| a.parse::<u128>().is_ok() && a != "0")
        .unwrap_or(false);
    released_ok && refunded_ok && amount_ok
}

const ESCROW_CONSTRAINTS: &str = r#"{
    "$schema": "https://example.org/constraint-file.schema.json",
    "schema_id": "Escrow",
    "contract_version": "1.2.0",
    "expression_version": "1.0",
    "constraints": [
        {
            "id": "released-has-timestamp",
            "expression": "state == 'released' => released_at != null",
            "severity": "error",
            "message": "a released escrow must carry released_at",
            "fields": ["state", "released_at"]
        },
        {
            "id": "refunded-has-timestamp",
            "expression": "state == 'refunded' => refunded_at != null",
            "severity": "error",
            "message": "a refunded escrow must carry refunded_at",
            "fields": ["state", "refunded_at"]
        },
        {
            "id": "amount-positive",
            "expression": "bigint_gt(amount, 0)",
            "severity": "error",
            "message": "amount must be positive",
            "fields": ["amount"]
        }
    ]
}"#;

#[test]
fn escrow_round_trip() -> Result<()> {
    let records = [
        r#"{"state": "held", "amount": "100"}"#,
        r#"{"state": "released", "amount": "100"}"#,
        r#"{"state": "released", "amount": "100", "released_at": "2026-03-01T00:00:00Z"}"#,
        r#"{"state": "released", "amount": "100", "released_at": null}"#,
        r#"{"state": "refunded", "amount": "5"}"#,
        r#"{"state": "refunded", "amount": "5", "refunded_at": "2026-03-02T00:00:00Z"}"#,
        r#"{"state": "held", "amount": "0"}"#,
        r#"{"state": "held", "amount": "340282366920938463463374607431768211455"}"#,
    ];

    let mut engine = Engine::new();
    engine.set_constraint_file(ConstraintFile::from_json_str(ESCROW_CONSTRAINTS)?)?;

    for record in records {
        let want = escrow_is_valid(&serde_json::from_str(record)?);
        let report = engine.check_record(&DataContext::from_json_str(record)?)?;
        assert_eq!(report.passed, want, "{record}: {report:?}");
    }
    Ok(())
}
