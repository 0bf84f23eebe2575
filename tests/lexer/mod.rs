// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use crossfield::unstable::*;
use crossfield::{tokenize, LexError};

fn kinds_and_texts(src: &str) -> Result<Vec<(TokenKind, String)>> {
    Ok(tokenize(src)?
        .into_iter()
        .map(|t| (t.kind, t.text))
        .collect())
}

// Tokens appear in order and never overlap. Outside string literals every
// token's bytes are exactly its text.
fn check_partition(src: &str) -> Result<()> {
    let tokens = tokenize(src)?;
    let mut last_end = 0;
    for t in &tokens {
        assert!(t.offset >= last_end, "{t:?} overlaps the previous token in `{src}`");
        assert!(t.end > t.offset, "{t:?} is empty");
        let raw = &src[t.offset as usize..t.end as usize];
        if t.kind != TokenKind::String {
            assert_eq!(raw, t.text);
        }
        assert!(src[last_end as usize..t.offset as usize]
            .chars()
            .all(char::is_whitespace));
        last_end = t.end;
    }
    assert!(src[last_end as usize..].chars().all(char::is_whitespace));
    Ok(())
}

#[test]
fn partitions_source() -> Result<()> {
    for src in [
        "bigint_sum([balance, reserved, consumed]) == original_allocation",
        "state == 'released' => released_at != null",
        "items.every(i => i.amount >= 0.5)&&!changed(x)||y<=z",
        "  a\t==\n\"b c\"  ",
        "name == 'é𝄞' && n > 10",
    ] {
        check_partition(src)?;
    }
    Ok(())
}

#[test]
fn operators() -> Result<()> {
    let ops: Vec<String> = kinds_and_texts("== != < > <= >= && || !")?
        .into_iter()
        .map(|(k, t)| {
            assert_eq!(k, TokenKind::Operator);
            t
        })
        .collect();
    assert_eq!(ops, ["==", "!=", "<", ">", "<=", ">=", "&&", "||", "!"]);
    Ok(())
}

#[test]
fn punctuation_and_arrow() -> Result<()> {
    assert_eq!(
        kinds_and_texts("f([a], b.c) => x")?,
        vec![
            (TokenKind::Ident, "f".to_string()),
            (TokenKind::Paren, "(".to_string()),
            (TokenKind::Bracket, "[".to_string()),
            (TokenKind::Ident, "a".to_string()),
            (TokenKind::Bracket, "]".to_string()),
            (TokenKind::Comma, ",".to_string()),
            (TokenKind::Ident, "b".to_string()),
            (TokenKind::Dot, ".".to_string()),
            (TokenKind::Ident, "c".to_string()),
            (TokenKind::Paren, ")".to_string()),
            (TokenKind::Arrow, "=>".to_string()),
            (TokenKind::Ident, "x".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn literals_are_identifiers() -> Result<()> {
    for lit in ["true", "false", "null", "_previous", "a_1"] {
        assert_eq!(kinds_and_texts(lit)?, vec![(TokenKind::Ident, lit.to_string())]);
    }
    Ok(())
}

#[test]
fn numbers() -> Result<()> {
    assert_eq!(
        kinds_and_texts("0 42 3.25 100000000000000000000000")?,
        vec![
            (TokenKind::Number, "0".to_string()),
            (TokenKind::Number, "42".to_string()),
            (TokenKind::Number, "3.25".to_string()),
            (TokenKind::Number, "100000000000000000000000".to_string()),
        ]
    );
    assert!(tokenize("1.x").is_err());
    assert!(tokenize("1.").is_err());
    Ok(())
}

#[test]
fn strings() -> Result<()> {
    let tokens = tokenize(r#"'it\'s' "say \"hi\"" 'a\\b' 'c\d'"#)?;
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, [r"it's", r#"say "hi""#, r"a\b", r"c\d"]);
    assert_eq!(tokens[0].offset, 0);
    assert_eq!(tokens[0].end, 7);
    Ok(())
}

#[test]
fn errors() {
    let cases = [
        ("a = b", "unexpected character: =", 2),
        ("a & b", "unexpected character: &", 2),
        ("a | b", "unexpected character: |", 2),
        ("x == 'open", "unterminated string literal", 5),
        ("x == \"open'", "unterminated string literal", 5),
        ("x == 12abc", "malformed numeric literal", 5),
        ("x == 1.2.3", "malformed numeric literal", 5),
        ("x == .5", "malformed numeric literal", 5),
        ("a + b", "unexpected character: +", 2),
        ("é == 1", "unexpected character: é", 0),
    ];
    for (src, message, offset) in cases {
        assert_eq!(
            tokenize(src),
            Err(LexError::new(message, offset)),
            "tokenizing `{src}`"
        );
    }
}

#[test]
fn empty_source() -> Result<()> {
    assert!(tokenize("")?.is_empty());
    assert!(tokenize(" \n\t ")?.is_empty());
    Ok(())
}
