// ABOUTME: Condition expressions for %if and %elseif directives
// ABOUTME: Supports null checks, boolean parameters, negation, && and || with parentheses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::parser::is_identifier;

/// Parsed condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr<'a> {
    Bool(bool),
    /// Bare parameter name; must hold a non-null boolean
    Var(&'a str),
    /// `name == null` (or `!=` when `negated`)
    IsNull { name: &'a str, negated: bool },
    Not(Box<Expr<'a>>),
    And(Box<Expr<'a>>, Box<Expr<'a>>),
    Or(Box<Expr<'a>>, Box<Expr<'a>>),
}

impl<'a> Expr<'a> {
    /// Evaluate with `lookup` resolving parameter state
    ///
    /// `lookup` returns `Err` for unknown names or non-boolean values.
    pub(crate) fn eval<E>(&self, lookup: &impl Fn(&'a str, Probe) -> Result<bool, E>) -> Result<bool, E> {
        Ok(match self {
            Self::Bool(b) => *b,
            Self::Var(name) => lookup(*name, Probe::Truth)?,
            Self::IsNull { name, negated } => lookup(*name, Probe::IsNull)? != *negated,
            Self::Not(inner) => !inner.eval(lookup)?,
            Self::And(lhs, rhs) => lhs.eval(lookup)? && rhs.eval(lookup)?,
            Self::Or(lhs, rhs) => lhs.eval(lookup)? || rhs.eval(lookup)?,
        })
    }
}

/// What a condition asks about a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    IsNull,
    Truth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Eq,
    Ne,
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut at = 0;
    while at < bytes.len() {
        let two = text.get(at..at + 2);
        match (bytes[at], two) {
            (b, _) if b.is_ascii_whitespace() => at += 1,
            (_, Some("==")) => {
                tokens.push(Token::Eq);
                at += 2;
            }
            (_, Some("!=")) => {
                tokens.push(Token::Ne);
                at += 2;
            }
            (_, Some("&&")) => {
                tokens.push(Token::And);
                at += 2;
            }
            (_, Some("||")) => {
                tokens.push(Token::Or);
                at += 2;
            }
            (b'!', _) => {
                tokens.push(Token::Not);
                at += 1;
            }
            (b'(', _) => {
                tokens.push(Token::Open);
                at += 1;
            }
            (b')', _) => {
                tokens.push(Token::Close);
                at += 1;
            }
            (b, _) if b.is_ascii_alphabetic() || b == b'_' => {
                let start = at;
                while at < bytes.len() && (bytes[at].is_ascii_alphanumeric() || bytes[at] == b'_') {
                    at += 1;
                }
                tokens.push(Token::Ident(&text[start..at]));
            }
            _ => {
                let rest: String = text[at..].chars().take(8).collect();
                return Err(format!("unexpected input at '{rest}'"));
            }
        }
    }
    Ok(tokens)
}

/// Parse a condition
pub(crate) fn parse(text: &str) -> Result<Expr<'_>, String> {
    let tokens = tokenize(text)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.or()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected {token:?}")),
    }
}

struct ExprParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.tokens.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expr<'a>, String> {
        let mut lhs = self.and()?;
        while self.eat(Token::Or) {
            lhs = Expr::Or(Box::new(lhs), Box::new(self.and()?));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr<'a>, String> {
        let mut lhs = self.unary()?;
        while self.eat(Token::And) {
            lhs = Expr::And(Box::new(lhs), Box::new(self.unary()?));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr<'a>, String> {
        if self.eat(Token::Not) {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr<'a>, String> {
        match self.next() {
            Some(Token::Open) => {
                let inner = self.or()?;
                if self.eat(Token::Close) {
                    Ok(inner)
                } else {
                    Err("missing ')'".to_owned())
                }
            }
            Some(Token::Ident("true")) => Ok(Expr::Bool(true)),
            Some(Token::Ident("false")) => Ok(Expr::Bool(false)),
            Some(Token::Ident("null")) => Err("null can only be compared to a parameter".to_owned()),
            Some(Token::Ident(name)) if is_identifier(name) => {
                let negated = if self.eat(Token::Eq) {
                    false
                } else if self.eat(Token::Ne) {
                    true
                } else {
                    return Ok(Expr::Var(name));
                };
                if self.eat(Token::Ident("null")) {
                    Ok(Expr::IsNull { name, negated })
                } else {
                    Err(format!("'{name}' can only be compared to null"))
                }
            }
            Some(token) => Err(format!("unexpected {token:?}")),
            None => Err("unexpected end of condition".to_owned()),
        }
    }
}
