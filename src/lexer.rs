// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::LexError;

use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Ident,
    Number,
    String,
    Operator,
    Paren,
    Bracket,
    Comma,
    Dot,
    Arrow,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Ident => "ident",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Paren => "paren",
            TokenKind::Bracket => "bracket",
            TokenKind::Comma => "comma",
            TokenKind::Dot => "dot",
            TokenKind::Arrow => "arrow",
        })
    }
}

/// A lexed token.
///
/// `text` is the token as written, except for string literals where it holds
/// the unescaped contents without quotes. `offset` and `end` delimit the
/// token's bytes in the source, quotes included.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: u32,
    pub end: u32,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let max = 32;
        let txt: String = self.text.escape_debug().take(max).collect();
        let trailer = if self.text.escape_debug().nth(max).is_some() {
            "..."
        } else {
            ""
        };

        f.write_fmt(format_args!(
            "{}:{}:{}, \"{}{}\"",
            self.kind, self.offset, self.end, txt, trailer
        ))
    }
}

#[derive(Clone)]
pub struct Lexer<'source> {
    source: &'source str,
    iter: Peekable<CharIndices<'source>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            iter: source.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.len(), '\x00'),
        }
    }

    fn at_end(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            text: self.source[start..end].to_string(),
            offset: start as u32,
            end: end as u32,
        }
    }

    fn read_ident(&mut self) -> Token {
        let start = self.peek().0;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.token(TokenKind::Ident, start, end)
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    // Integer or decimal: digits ('.' digits)?
    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.peek().0;
        self.read_digits();

        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        let end = self.peek().0;

        // A valid number cannot be followed by these characters.
        let ch = self.peek().1;
        if ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
            return Err(LexError::new("malformed numeric literal", start as u32));
        }

        Ok(self.token(TokenKind::Number, start, end))
    }

    // Single- or double-quoted. A backslash escapes the opening quote
    // character or another backslash; any other backslash is kept as is.
    fn read_string(&mut self) -> Result<Token, LexError> {
        let (start, quote) = self.peek();
        self.iter.next();
        let mut value = String::new();
        loop {
            let (_, ch) = self.peek();
            if self.at_end() {
                return Err(LexError::new("unterminated string literal", start as u32));
            }
            self.iter.next();
            match ch {
                c if c == quote => break,
                '\\' => match self.peek().1 {
                    next if (next == quote || next == '\\') && !self.at_end() => {
                        value.push(next);
                        self.iter.next();
                    }
                    _ => value.push('\\'),
                },
                _ => value.push(ch),
            }
        }
        let end = self.peek().0;
        Ok(Token {
            kind: TokenKind::String,
            text: value,
            offset: start as u32,
            end: end as u32,
        })
    }

    fn skip_ws(&mut self) {
        while !self.at_end() && self.peek().1.is_whitespace() {
            self.iter.next();
        }
    }

    /// Lex the next token. Returns `Ok(None)` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_ws();
        if self.at_end() {
            return Ok(None);
        }

        let (start, chr) = self.peek();
        let next = self.peekahead(1).1;

        let tok = match chr {
            // => must win over ==.
            '=' if next == '>' => {
                self.iter.next();
                self.iter.next();
                self.token(TokenKind::Arrow, start, start + 2)
            }
            '=' | '!' | '<' | '>' if next == '=' => {
                self.iter.next();
                self.iter.next();
                self.token(TokenKind::Operator, start, start + 2)
            }
            '&' | '|' if next == chr => {
                self.iter.next();
                self.iter.next();
                self.token(TokenKind::Operator, start, start + 2)
            }
            '<' | '>' | '!' => {
                self.iter.next();
                self.token(TokenKind::Operator, start, start + 1)
            }
            '(' | ')' => {
                self.iter.next();
                self.token(TokenKind::Paren, start, start + 1)
            }
            '[' | ']' => {
                self.iter.next();
                self.token(TokenKind::Bracket, start, start + 1)
            }
            ',' => {
                self.iter.next();
                self.token(TokenKind::Comma, start, start + 1)
            }
            '.' if next.is_ascii_digit() => {
                return Err(LexError::new("malformed numeric literal", start as u32))
            }
            '.' => {
                self.iter.next();
                self.token(TokenKind::Dot, start, start + 1)
            }
            '\'' | '"' => self.read_string()?,
            _ if chr.is_ascii_digit() => self.read_number()?,
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => {
                return Err(LexError::new(
                    format!("unexpected character: {chr}"),
                    start as u32,
                ))
            }
        };
        Ok(Some(tok))
    }
}

/// Lex an expression into a flat token stream.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = vec![];
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}
