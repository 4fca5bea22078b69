//! Recursive-descent parser for the shorthand condition syntax.
//!
//! ```text
//! or         := and ( '|' and )*
//! and        := unary ( (';' | ',') unary )*
//! unary      := '!' unary | '(' or ')' | comparison
//! comparison := key op value
//! op         := '>=' | '<=' | '!=' | '==' | '=' | '>' | '<' | '~'
//! value      := quoted | bare
//! ```
//!
//! Bare keys and values end at the next operator or separator and are
//! trimmed. Empty segments between separators are skipped, so a trailing
//! `;` is accepted.

use super::ast::{CompareOp, ConditionExpr};
use crate::error::{BomError, Result};

/// Parse a shorthand expression such as `Color=Red; Voltage>=200`.
///
/// Returns `Ok(None)` for a blank string.
pub fn parse_shorthand(input: &str) -> Result<Option<ConditionExpr>> {
    let mut parser = Parser::new(input);
    parser.skip_ws();
    if parser.at_end() {
        return Ok(None);
    }
    let expr = parser.parse_or()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(Some(expr))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: &str) -> BomError {
        BomError::invalid(format!(
            "invalid condition '{}' at offset {}: {message}",
            self.input, self.pos
        ))
    }

    fn skip_separators(&mut self, separators: &[char]) -> bool {
        let mut seen = false;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(c) if separators.contains(&c) => {
                    self.bump();
                    seen = true;
                }
                _ => return seen,
            }
        }
    }

    fn ends_operand(&self) -> bool {
        matches!(self.peek(), None | Some('|' | ')'))
    }

    fn parse_or(&mut self) -> Result<ConditionExpr> {
        let mut items = vec![self.parse_and()?];
        while self.skip_separators(&['|']) {
            if self.ends_operand() {
                break;
            }
            items.push(self.parse_and()?);
        }
        Ok(collapse(items, ConditionExpr::any))
    }

    fn parse_and(&mut self) -> Result<ConditionExpr> {
        let mut items = vec![self.parse_unary()?];
        while self.skip_separators(&[';', ',']) {
            if self.ends_operand() {
                break;
            }
            items.push(self.parse_unary()?);
        }
        Ok(collapse(items, ConditionExpr::all))
    }

    fn parse_unary(&mut self) -> Result<ConditionExpr> {
        self.skip_ws();
        match self.peek() {
            Some('!') => {
                self.bump();
                Ok(ConditionExpr::not(self.parse_unary()?))
            }
            Some('(') => {
                self.bump();
                let inner = self.parse_or()?;
                self.skip_ws();
                if self.bump() != Some(')') {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(_) => self.parse_comparison(),
            None => Err(self.error("expected a comparison")),
        }
    }

    fn parse_comparison(&mut self) -> Result<ConditionExpr> {
        let key = self.take_until(|c| matches!(c, '=' | '!' | '<' | '>' | '~' | ';' | ',' | '|' | '(' | ')'));
        let key = key.trim();
        if key.is_empty() {
            return Err(self.error("expected an option name"));
        }
        let op = self.parse_op()?;
        let value = self.parse_value()?;
        Ok(ConditionExpr::compare(key, op, value))
    }

    fn parse_op(&mut self) -> Result<CompareOp> {
        const OPS: &[(&str, CompareOp)] = &[
            (">=", CompareOp::Gte),
            ("<=", CompareOp::Lte),
            ("!=", CompareOp::Ne),
            ("==", CompareOp::Eq),
            ("=", CompareOp::Eq),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
            ("~", CompareOp::Regex),
        ];
        for (symbol, op) in OPS {
            if self.rest().starts_with(symbol) {
                self.pos += symbol.len();
                return Ok(*op);
            }
        }
        Err(self.error("expected an operator"))
    }

    fn parse_value(&mut self) -> Result<String> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_until(|c| c == quote);
                if self.bump() != Some(quote) {
                    return Err(self.error("unterminated quoted value"));
                }
                Ok(value.to_string())
            }
            _ => {
                let value = self.take_until(|c| matches!(c, ';' | ',' | '|' | ')'));
                let value = value.trim();
                if value.is_empty() {
                    return Err(self.error("expected a value"));
                }
                Ok(value.to_string())
            }
        }
    }

    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stop(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }
}

fn collapse(mut items: Vec<ConditionExpr>, combine: fn(Vec<ConditionExpr>) -> ConditionExpr) -> ConditionExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        combine(items)
    }
}
