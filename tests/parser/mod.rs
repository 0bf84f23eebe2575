// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use crossfield::unstable::*;
use crossfield::{validate_expression, Builtin, ExpressionVersion, SyntaxError, TemporalOp};

fn parse(src: &str) -> Result<ExprRef, SyntaxError> {
    Parser::new(src)?.parse()
}

#[test]
fn implication_is_lowest() -> Result<()> {
    let src = "a && b => c || d";
    match parse(src)?.as_ref() {
        Expr::Implies {
            antecedent,
            consequent,
            span,
        } => {
            assert!(matches!(antecedent.as_ref(), Expr::And { .. }));
            assert!(matches!(consequent.as_ref(), Expr::Or { .. }));
            assert_eq!(*span, Span::new(0, src.len() as u32));
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn implication_does_not_chain() {
    let err = parse("a => b => c").unwrap_err();
    assert_eq!(err.offset, 7);
    assert_eq!(err.message, "unexpected trailing arrow `=>`");
}

#[test]
fn call_shapes() -> Result<()> {
    let src = "bigint_sum(items, 'amount')";
    match parse(src)?.as_ref() {
        Expr::Call {
            builtin, args, span, ..
        } => {
            assert_eq!(*builtin, Builtin::BigintSum);
            assert_eq!(args.len(), 2);
            assert!(matches!(args[0].as_ref(), Expr::Path(_)));
            assert!(matches!(args[1].as_ref(), Expr::String { .. }));
            assert_eq!(*span, Span::new(0, src.len() as u32));
        }
        other => panic!("unexpected {other:?}"),
    }

    match parse("delta(escrow.amount)")?.as_ref() {
        Expr::Temporal { op, path, .. } => {
            assert_eq!(*op, TemporalOp::Delta);
            assert_eq!(path.dotted(), "escrow.amount");
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn bigint_sum_arguments_are_primaries() {
    // A comparison is not a primary.
    assert!(parse("bigint_sum(a == b)").is_err());
    assert!(parse("bigint_sum((a))").is_ok());
    assert!(parse("bigint_sum([a, b.c, d])").is_ok());
    assert!(parse("bigint_gte(a == b, c)").is_ok());
}

#[test]
fn every_binds_its_parameter() -> Result<()> {
    match parse("items.every(i => i.amount > 0)")?.as_ref() {
        Expr::Path(path) => {
            assert_eq!(path.root(), "items");
            match &path.suffix {
                Some(PathSuffix::Every { param, body, .. }) => {
                    assert_eq!(param.as_ref(), "i");
                    assert!(matches!(body.as_ref(), Expr::Compare { op: BoolOp::Gt, .. }));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn list_items_are_field_paths() {
    assert!(parse("bigint_sum([a, 'b'])").is_err());
    assert!(parse("[a, b] == c").is_ok());
    assert!(parse("[a,]").is_err());
}

#[test]
fn reserved_roots() {
    for src in ["true.x", "null.y"] {
        assert!(parse(src).is_err(), "{src}");
    }
    for name in crossfield::reserved_names() {
        let r = validate_expression(&format!("{name}.field == 1"));
        assert!(!r.valid, "`{name}` used as a path root");
    }
}

#[test]
fn offsets_point_at_the_problem() {
    let cases = [
        ("a == ", 4),
        ("a == b)", 6),
        ("bigint_gte(a, b", 15),
        ("items.every(x x)", 14),
        ("[a b]", 3),
        ("(a || )", 6),
    ];
    for (src, offset) in cases {
        let err = parse(src).unwrap_err();
        assert_eq!(err.offset, offset, "`{src}`: {err}");
    }
}

#[test]
fn version_gate_positions() {
    let v1 = ExpressionVersion::V1;
    let err = parse_expression("a && delta(b) > 0", v1, MAX_EXPRESSION_DEPTH).unwrap_err();
    assert_eq!(err.offset, 5);
    assert!(parse_expression("a && delta(b) > 0", ExpressionVersion::V2, MAX_EXPRESSION_DEPTH).is_ok());
}

#[test]
fn render_points_at_column() {
    let src = "state == 'released' =>\n  released_at != ";
    let err = parse(src).unwrap_err();
    let rendered = err.render(src, "escrow.json");
    let lines: Vec<&str> = rendered.split('\n').collect();
    assert_eq!(lines[1], "--> escrow.json:2:17");
    assert_eq!(lines[3], "2 |   released_at != ");
    assert_eq!(lines[4], format!("  | {}^", " ".repeat(16)));
    assert!(lines[5].starts_with("error: unexpected end of expression"));
}

#[test]
fn clock_and_timestamp_arity() {
    assert!(parse("is_after(a, now())").is_ok());
    assert!(parse("is_between(d, lo, hi)").is_ok());

    let err = parse("now(a)").unwrap_err();
    assert_eq!(err.offset, 4);
    assert_eq!(err.message, "`now` expects no arguments");

    let err = parse("is_stale(ts, 3600)").unwrap_err();
    assert_eq!(err.message, "`is_stale` expects 3 arguments");

    let err = parse_expression("is_after(a, b)", ExpressionVersion::V1, MAX_EXPRESSION_DEPTH)
        .unwrap_err();
    assert_eq!(err.message, "`is_after` requires expression_version 2.0");
}
