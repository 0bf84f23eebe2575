// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::builtins::temporal::TemporalOp;
use crate::builtins::{is_callable, Arguments, Builtin};
use crate::error::SyntaxError;
use crate::lexer::*;
use crate::number::Number;
use crate::version::ExpressionVersion;
use crate::*;

use core::str::FromStr;

/// Hard bound on expression nesting. Parenthesised groups, `.every` bodies
/// and builtin arguments each open one level.
pub const MAX_EXPRESSION_DEPTH: u32 = 32;

type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
    max_depth: u32,
    version: ExpressionVersion,
}

impl Parser {
    pub fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
            max_depth: MAX_EXPRESSION_DEPTH,
            version: ExpressionVersion::LATEST,
        })
    }

    pub fn with_version(mut self, version: ExpressionVersion) -> Self {
        self.version = version;
        self
    }

    /// Tighten the nesting bound. It can never exceed [`MAX_EXPRESSION_DEPTH`].
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.min(MAX_EXPRESSION_DEPTH);
        self
    }

    /// Parse a complete expression. Every token must be consumed.
    pub fn parse(mut self) -> ParseResult<ExprRef> {
        let expr = self.parse_expr()?;
        if let Some(tok) = self.peek() {
            return Err(SyntaxError::new(
                format!("unexpected trailing {} `{}`", tok.kind, tok.text),
                tok.offset,
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, kind: TokenKind, text: &str) -> bool {
        self.peek().map(|t| t.is(kind, text)).unwrap_or(false)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // Offset just past the last consumed token.
    fn last_offset(&self) -> u32 {
        match self.pos.checked_sub(1).and_then(|p| self.tokens.get(p)) {
            Some(t) => t.end,
            None => 0,
        }
    }

    fn current_offset(&self) -> u32 {
        self.peek().map(|t| t.offset).unwrap_or_else(|| self.last_offset())
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        match self.peek() {
            Some(tok) => SyntaxError::new(
                format!("unexpected {} `{}` {context}", tok.kind, tok.text),
                tok.offset,
            ),
            None => SyntaxError::new(
                format!("unexpected end of expression {context}"),
                self.last_offset(),
            ),
        }
    }

    fn expect(&mut self, kind: TokenKind, text: &str, context: &str) -> ParseResult<Token> {
        match self.peek() {
            Some(tok) if tok.is(kind, text) => (),
            Some(tok) => {
                return Err(SyntaxError::new(
                    format!("expecting `{text}` {context}, got `{}`", tok.text),
                    tok.offset,
                ))
            }
            None => {
                return Err(SyntaxError::new(
                    format!("expecting `{text}` {context}"),
                    self.last_offset(),
                ))
            }
        }
        self.advance().ok_or_else(|| self.unexpected(context))
    }

    fn expect_ident(&mut self, context: &str) -> ParseResult<Token> {
        if !self.peek().map(|t| t.kind == TokenKind::Ident).unwrap_or(false) {
            return Err(self.unexpected(context));
        }
        self.advance().ok_or_else(|| self.unexpected(context))
    }

    fn require_version(&self, name: &str, since_major: u32, offset: u32) -> ParseResult<()> {
        if self.version.allows(since_major) {
            Ok(())
        } else {
            Err(SyntaxError::new(
                format!("`{name}` requires expression_version {since_major}.0"),
                offset,
            ))
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.max_depth {
            return Err(SyntaxError::new(
                "expression nesting exceeds maximum depth",
                self.current_offset(),
            ));
        }
        self.depth += 1;
        let r = f(self);
        self.depth -= 1;
        r
    }

    fn parse_nested_expr(&mut self) -> ParseResult<ExprRef> {
        self.nested(|p| p.parse_expr())
    }

    // Expr := Or ( '=>' Or )?
    fn parse_expr(&mut self) -> ParseResult<ExprRef> {
        let antecedent = self.parse_or()?;
        if self.peek().map(|t| t.kind == TokenKind::Arrow).unwrap_or(false) {
            self.advance();
            let consequent = self.parse_or()?;
            let span = antecedent.span().join(consequent.span());
            return Ok(Ref::new(Expr::Implies {
                span,
                antecedent,
                consequent,
            }));
        }
        Ok(antecedent)
    }

    fn parse_or(&mut self) -> ParseResult<ExprRef> {
        let first = self.parse_and()?;
        let mut operands = vec![first];
        while self.peek_is(TokenKind::Operator, "||") {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(Self::connective(operands, |span, operands| Expr::Or {
            span,
            operands,
        }))
    }

    fn parse_and(&mut self) -> ParseResult<ExprRef> {
        let first = self.parse_comparison()?;
        let mut operands = vec![first];
        while self.peek_is(TokenKind::Operator, "&&") {
            self.advance();
            operands.push(self.parse_comparison()?);
        }
        Ok(Self::connective(operands, |span, operands| Expr::And {
            span,
            operands,
        }))
    }

    fn connective(
        mut operands: Vec<ExprRef>,
        make: impl FnOnce(Span, Vec<ExprRef>) -> Expr,
    ) -> ExprRef {
        if operands.len() == 1 {
            if let Some(only) = operands.pop() {
                return only;
            }
        }
        let span = operands
            .iter()
            .map(|e| e.span())
            .reduce(Span::join)
            .unwrap_or_default();
        Ref::new(make(span, operands))
    }

    fn parse_comparison(&mut self) -> ParseResult<ExprRef> {
        let lhs = self.parse_unary()?;
        let op = match self.peek() {
            Some(tok) if tok.kind == TokenKind::Operator => BoolOp::from_text(&tok.text),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.parse_unary()?;
        let span = lhs.span().join(rhs.span());
        Ok(Ref::new(Expr::Compare { span, op, lhs, rhs }))
    }

    // Unary := '!' Unary | Primary
    // Runs of `!` are counted rather than recursed into.
    fn parse_unary(&mut self) -> ParseResult<ExprRef> {
        let start = self.current_offset();
        let mut negations = 0u32;
        while self.peek_is(TokenKind::Operator, "!") {
            self.advance();
            negations = negations.saturating_add(1);
        }
        let expr = self.parse_primary()?;
        if negations == 0 {
            return Ok(expr);
        }
        let span = Span::new(start, expr.span().end);
        Ok(Ref::new(Expr::Not {
            span,
            negations,
            expr,
        }))
    }

    fn parse_primary(&mut self) -> ParseResult<ExprRef> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("while parsing an operand"));
        };
        let span = Span::new(tok.offset, tok.end);

        match tok.kind {
            // The group's depth is checked before `(` is consumed so that an
            // overflow is reported at the parenthesis.
            TokenKind::Paren if tok.text == "(" => self.nested(|p| {
                p.advance();
                let expr = p.parse_expr()?;
                p.expect(TokenKind::Paren, ")", "to close group")?;
                Ok(expr)
            }),
            TokenKind::Bracket if tok.text == "[" => self.parse_list(),
            TokenKind::Number => {
                self.advance();
                let value = Number::from_str(&tok.text).map_err(|_| {
                    SyntaxError::new("malformed numeric literal", tok.offset)
                })?;
                Ok(Ref::new(Expr::Number { span, value }))
            }
            TokenKind::String => {
                self.advance();
                Ok(Ref::new(Expr::String {
                    span,
                    value: Rc::from(tok.text.as_str()),
                }))
            }
            TokenKind::Ident => match tok.text.as_str() {
                "null" => {
                    self.advance();
                    Ok(Ref::new(Expr::Null(span)))
                }
                "true" | "false" => {
                    self.advance();
                    Ok(Ref::new(Expr::Bool {
                        span,
                        value: tok.text == "true",
                    }))
                }
                name => match (Builtin::from_name(name), TemporalOp::from_name(name)) {
                    (Some(builtin), _) => self.parse_call(builtin),
                    (None, Some(op)) => self.parse_temporal(op),
                    (None, None) => Ok(Ref::new(Expr::Path(self.parse_field_path()?))),
                },
            },
            _ => Err(self.unexpected("while parsing an operand")),
        }
    }

    // '[' FieldPath (',' FieldPath)* ']'
    fn parse_list(&mut self) -> ParseResult<ExprRef> {
        let open = self.expect(TokenKind::Bracket, "[", "to open list")?;
        let mut items = vec![self.parse_field_path()?];
        while self.peek().map(|t| t.kind == TokenKind::Comma).unwrap_or(false) {
            self.advance();
            items.push(self.parse_field_path()?);
        }
        let close = self.expect(TokenKind::Bracket, "]", "to close list")?;
        Ok(Ref::new(Expr::List {
            span: Span::new(open.offset, close.end),
            items,
        }))
    }

    // Name token and opening paren of a call.
    fn parse_callee(&mut self, name: &str, since_major: u32) -> ParseResult<Token> {
        let Some(name_tok) = self.advance() else {
            return Err(self.unexpected("while parsing a call"));
        };
        self.require_version(name, since_major, name_tok.offset)?;
        self.expect(TokenKind::Paren, "(", &format!("after `{name}`"))?;
        Ok(name_tok)
    }

    // ('changed'|'previous'|'delta') '(' FieldPath ')'
    fn parse_temporal(&mut self, op: TemporalOp) -> ParseResult<ExprRef> {
        let name = op.name();
        let name_tok = self.parse_callee(name, TemporalOp::SINCE_MAJOR)?;
        let path = self.parse_field_path()?;
        let close = self.expect(TokenKind::Paren, ")", &format!("to close `{name}`"))?;
        Ok(Ref::new(Expr::Temporal {
            span: Span::new(name_tok.offset, close.end),
            op,
            path,
        }))
    }

    fn parse_call(&mut self, builtin: Builtin) -> ParseResult<ExprRef> {
        let name = builtin.name();
        let name_tok = self.parse_callee(name, builtin.since_major())?;

        let expr = match builtin.arguments() {
            Arguments::Primaries { min, max } => {
                let args = self.parse_args(|p| p.nested(|p| p.parse_primary()), max)?;
                let close = self.close_call(name, args.len(), min, max)?;
                Expr::Call {
                    span: Span::new(name_tok.offset, close.end),
                    builtin,
                    args,
                }
            }
            Arguments::Exprs(n) => {
                let args = self.parse_args(|p| p.parse_nested_expr(), n)?;
                let close = self.close_call(name, args.len(), n, n)?;
                Expr::Call {
                    span: Span::new(name_tok.offset, close.end),
                    builtin,
                    args,
                }
            }
        };
        Ok(Ref::new(expr))
    }

    // Comma separated arguments, stopping after `max` or at `)`.
    fn parse_args(
        &mut self,
        mut parse_one: impl FnMut(&mut Self) -> ParseResult<ExprRef>,
        max: usize,
    ) -> ParseResult<Vec<ExprRef>> {
        let mut args = vec![];
        if max == 0 || self.peek_is(TokenKind::Paren, ")") {
            return Ok(args);
        }
        loop {
            args.push(parse_one(self)?);
            if args.len() >= max
                || !self.peek().map(|t| t.kind == TokenKind::Comma).unwrap_or(false)
            {
                break;
            }
            self.advance();
        }
        Ok(args)
    }

    fn close_call(
        &mut self,
        name: &str,
        count: usize,
        min: usize,
        max: usize,
    ) -> ParseResult<Token> {
        let extra = count == max
            && match self.peek() {
                Some(t) if t.kind == TokenKind::Comma => true,
                Some(t) => max == 0 && !t.is(TokenKind::Paren, ")"),
                None => false,
            };
        if count < min || extra {
            let expected = match (min, max) {
                (0, 0) => "no arguments".to_string(),
                (1, 1) => "1 argument".to_string(),
                (min, max) if min == max => format!("{min} arguments"),
                (min, max) => format!("{min} or {max} arguments"),
            };
            return Err(SyntaxError::new(
                format!("`{name}` expects {expected}"),
                self.current_offset(),
            ));
        }
        self.expect(TokenKind::Paren, ")", &format!("to close `{name}`"))
    }

    // FieldPath := IDENT ( '.' (IDENT | 'length' | 'every' '(' IDENT '=>' Expr ')') )*
    fn parse_field_path(&mut self) -> ParseResult<FieldPath> {
        let root = self.expect_ident("where a field path was expected")?;
        if matches!(root.text.as_str(), "true" | "false" | "null") || is_callable(&root.text)
        {
            return Err(SyntaxError::new(
                format!("`{}` is reserved and cannot start a field path", root.text),
                root.offset,
            ));
        }

        let mut segments = vec![Rc::<str>::from(root.text.as_str())];
        let mut end = root.end;
        let mut suffix = None;

        while self.peek().map(|t| t.kind == TokenKind::Dot).unwrap_or(false) {
            self.advance();
            let seg = self.expect_ident("after `.`")?;
            match seg.text.as_str() {
                "length" => {
                    let span = Span::new(seg.offset, seg.end);
                    end = seg.end;
                    suffix = Some(PathSuffix::Length { span });
                    break;
                }
                "every" if self.peek_is(TokenKind::Paren, "(") => {
                    self.require_version("every", 2, seg.offset)?;
                    let (body_suffix, close_end) = self.parse_every(seg.offset)?;
                    end = close_end;
                    suffix = Some(body_suffix);
                    break;
                }
                _ => {
                    end = seg.end;
                    segments.push(Rc::from(seg.text.as_str()));
                }
            }
        }

        Ok(FieldPath {
            span: Span::new(root.offset, end),
            segments,
            suffix,
        })
    }

    // 'every' '(' IDENT '=>' Expr ')', with `every` already consumed.
    fn parse_every(&mut self, start: u32) -> ParseResult<(PathSuffix, u32)> {
        self.expect(TokenKind::Paren, "(", "after `every`")?;
        let param = self.expect_ident("as the `every` parameter")?;
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Arrow => {
                self.advance();
            }
            _ => return Err(self.unexpected("after the `every` parameter, expecting `=>`")),
        }
        let body = self.parse_nested_expr()?;
        let close = self.expect(TokenKind::Paren, ")", "to close `every`")?;
        Ok((
            PathSuffix::Every {
                span: Span::new(start, close.end),
                param: Rc::from(param.text.as_str()),
                body,
            },
            close.end,
        ))
    }
}

/// Parse `source` under the given grammar version and nesting bound.
pub fn parse_expression(
    source: &str,
    version: ExpressionVersion,
    max_depth: u32,
) -> Result<ExprRef, SyntaxError> {
    Parser::new(source)?
        .with_version(version)
        .with_max_depth(max_depth)
        .parse()
}
