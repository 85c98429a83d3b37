// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for the structured literals stored in container definitions.
//!
//! Structured fields hold a single string such as `{80: 8080}` or
//! `['/data', '/srv:/srv:ro']`. The accepted grammar:
//!
//! ```text
//! value   := mapping | list | tuple | string | integer | keyword
//! mapping := '{' (value ':' value (',' value ':' value)* ','?)? '}'
//! list    := '[' (value (',' value)* ','?)? ']'
//! tuple   := '(' (value (',' value)* ','?)? ')'      -- `(x)` is just `x`
//! string  := '\'' ... '\'' | '"' ... '"'             -- backslash escapes
//! integer := ('+' | '-')? digit+
//! keyword := None | null | True | true | False | false
//! ```
//!
//! JSON documents without floats parse under the same grammar.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Nesting limit for brackets; deeper input is rejected rather than recursed.
const MAX_DEPTH: usize = 32;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// Mapping entries in source order.
    Map(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::None => "none",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "integer",
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Map(_) => "mapping",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

}

/// Errors produced while parsing a literal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid escape sequence at position {pos}")]
    InvalidEscape { pos: usize },

    #[error("integer out of range at position {pos}")]
    IntOutOfRange { pos: usize },

    #[error("unknown name '{name}' at position {pos}")]
    UnknownName { name: String, pos: usize },

    #[error("nesting deeper than {MAX_DEPTH} at position {pos}")]
    TooDeep { pos: usize },

    #[error("trailing input at position {pos}")]
    TrailingInput { pos: usize },
}

/// Parse a complete literal; anything but whitespace after the value is an error.
pub fn parse(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.peek_char().is_some() {
        return Err(LiteralError::TrailingInput { pos: parser.pos() });
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, chars: input.char_indices().peekable(), depth: 0 }
    }

    #[inline]
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Byte offset of the next character (input length at end).
    fn pos(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.input.len())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Consume `expected` if it is the next non-whitespace character.
    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek_char() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.eat(expected) {
            return Ok(());
        }
        let pos = self.pos();
        match self.peek_char() {
            Some(ch) => Err(LiteralError::UnexpectedChar { ch, pos }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_whitespace();
        let pos = self.pos();
        match self.peek_char() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => {
                self.chars.next();
                self.nested(pos, |p| p.sequence(']').map(|(items, _)| Literal::List(items)))
            }
            Some('(') => {
                self.chars.next();
                self.nested(pos, Self::tuple)
            }
            Some('{') => {
                self.chars.next();
                self.nested(pos, Self::mapping)
            }
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                self.string(quote, pos).map(Literal::Str)
            }
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.integer(pos),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.keyword(pos),
            Some(ch) => Err(LiteralError::UnexpectedChar { ch, pos }),
        }
    }

    fn nested<F>(&mut self, pos: usize, f: F) -> Result<Literal, LiteralError>
    where
        F: FnOnce(&mut Self) -> Result<Literal, LiteralError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep { pos });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Comma-separated values up to `close`. Returns the items and whether
    /// any separator was seen (distinguishes `(x)` from `(x,)`).
    fn sequence(&mut self, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            items.push(self.value()?);
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            self.expect(close)?;
            return Ok((items, saw_comma));
        }
    }

    fn tuple(&mut self) -> Result<Literal, LiteralError> {
        let (mut items, saw_comma) = self.sequence(')')?;
        if !saw_comma && items.len() == 1 {
            if let Some(item) = items.pop() {
                return Ok(item);
            }
        }
        Ok(Literal::Tuple(items))
    }

    fn mapping(&mut self) -> Result<Literal, LiteralError> {
        let mut entries = Vec::new();
        loop {
            if self.eat('}') {
                return Ok(Literal::Map(entries));
            }
            let key = self.value()?;
            self.expect(':')?;
            let value = self.value()?;
            entries.push((key, value));
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            return Ok(Literal::Map(entries));
        }
    }

    /// Read a quoted string; the opening quote is already consumed.
    fn string(&mut self, quote: char, start: usize) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            let Some((pos, ch)) = self.chars.next() else {
                return Err(LiteralError::UnterminatedString { pos: start });
            };
            match ch {
                c if c == quote => return Ok(out),
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        return Err(LiteralError::UnterminatedString { pos: start });
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' | '/' => out.push(escaped),
                        'u' => out.push(self.unicode_escape(pos)?),
                        other => {
                            // Unknown escapes are kept verbatim.
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self, pos: usize) -> Result<char, LiteralError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or(LiteralError::InvalidEscape { pos })?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LiteralError::InvalidEscape { pos })
    }

    fn integer(&mut self, start: usize) -> Result<Literal, LiteralError> {
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek_char() {
            text.push(sign);
            self.chars.next();
        }
        while let Some(c) = self.peek_char().filter(char::is_ascii_digit) {
            text.push(c);
            self.chars.next();
        }
        if text.len() == 1 && !text.starts_with(|c: char| c.is_ascii_digit()) {
            let pos = self.pos();
            return match self.peek_char() {
                Some(ch) => Err(LiteralError::UnexpectedChar { ch, pos }),
                None => Err(LiteralError::UnexpectedEnd),
            };
        }
        text.parse::<i64>().map(Literal::Int).map_err(|_| LiteralError::IntOutOfRange { pos: start })
    }

    fn keyword(&mut self, start: usize) -> Result<Literal, LiteralError> {
        let mut name = String::new();
        while let Some(c) = self.peek_char().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            name.push(c);
            self.chars.next();
        }
        match name.as_str() {
            "None" | "null" => Ok(Literal::None),
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            _ => Err(LiteralError::UnknownName { name, pos: start }),
        }
    }
}

#[cfg(test)]
#[path = "literal_tests.rs"]
mod tests;
