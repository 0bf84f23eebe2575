// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use crossfield::*;

#[test]
fn supported_versions() {
    for v in ["1.0", "1.7", "2.0", "2.3", EXPRESSION_VERSION] {
        assert!(expression_version_supported(v), "{v}");
    }
    for v in ["3.0", "0.9", "2", "2.0.0", "v2.0", "", " 2.0", "2.x", "-1.0"] {
        assert!(!expression_version_supported(v), "{v}");
    }
}

#[test]
fn version_errors() {
    assert_eq!(
        "2.0.1".parse::<ExpressionVersion>(),
        Err(ConstraintFileError::MalformedExpressionVersion("2.0.1".to_string()))
    );
    assert_eq!(
        ExpressionVersion::parse_supported("3.0"),
        Err(ConstraintFileError::UnsupportedExpressionVersion("3.0".to_string()))
    );
    assert_eq!(ExpressionVersion::parse_supported("2.1").map(|v| v.major), Ok(2));
}

const BASE_GRAMMAR: &[&str] = &[
    "a == 1",
    "a.b.c != null && !(x < 2.5)",
    "state == 'released' => released_at != null",
    "bigint_sum([balance, reserved, consumed]) == original_allocation",
    "bigint_sum(items, 'amount') == total",
    "bigint_gte(bigint_sum([a, b]), limit) || bigint_gt(a, \"0\")",
    "items.length > 0 && name.length <= 64",
    "!!!flag",
];

#[test]
fn grammar_two_accepts_grammar_one() {
    for expr in BASE_GRAMMAR {
        assert!(
            validate_expression_for_version(expr, ExpressionVersion::V1).valid,
            "{expr}"
        );
        assert!(
            validate_expression_for_version(expr, ExpressionVersion::V2).valid,
            "{expr}"
        );
    }
}

#[test]
fn grammar_one_rejects_grammar_two_constructs() {
    for expr in [
        "changed(a)",
        "previous(a) == 1",
        "delta(a) > 0",
        "xs.every(x => x)",
        "bigint_eq(a, b)",
        "bigint_add(a, b) == '1'",
        "bigint_sub(a, b) == '1'",
        "eq(a, b)",
        "len(a) == 1",
        "type_of(a) == 'string'",
        "is_bigint_coercible(a)",
        "object_keys_subset(a, b)",
    ] {
        let r = validate_expression_for_version(expr, ExpressionVersion::V1);
        assert!(!r.valid, "{expr}");
        assert!(
            r.error
                .as_deref()
                .is_some_and(|e| e.ends_with("requires expression_version 2.0")),
            "{expr}: {r:?}"
        );
        assert!(validate_expression(expr).valid, "{expr}");
    }
}

#[test]
fn constraint_file_version_governs_its_expressions() -> Result<()> {
    let json = r#"{
        "schema_id": "Escrow",
        "contract_version": "1.0.0",
        "expression_version": "1.0",
        "constraints": [
            {"id": "c", "expression": "changed(state)", "severity": "warning", "message": "m"}
        ]
    }"#;
    let mut f = ConstraintFile::from_json_str(json)?;
    assert!(matches!(
        f.validate().as_slice(),
        [ConstraintFileError::InvalidExpression { .. }]
    ));

    f.expression_version = "2.0".to_string();
    assert!(f.validate().is_empty());

    f.expression_version = "3.0".to_string();
    assert_eq!(
        f.validate(),
        vec![ConstraintFileError::UnsupportedExpressionVersion("3.0".to_string())]
    );
    Ok(())
}
