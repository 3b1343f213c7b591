// ABOUTME: Parser turning two-way SQL text into a tree of text, bind and conditional nodes
// ABOUTME: Skips quoted strings and plain comments and strips the test literal after each variable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::expression::{self, Expr};
use super::syntax_error;
use crate::errors::TemplateError;

/// Parsed template node
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node<'a> {
    /// SQL text copied as-is
    Text(&'a str),
    /// `/*name*/test`: bound through a placeholder
    Bind(Variable<'a>),
    /// `/*^name*/test`: inlined as a literal
    Literal(Variable<'a>),
    /// `/*%if*/ ... /*%end*/`
    If(IfBlock<'a>),
}

/// Variable reference inside a directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Variable<'a> {
    pub name: &'a str,
    /// Test literal was a parenthesised list
    pub parenthesized: bool,
    /// Byte offset of the directive
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch<'a> {
    pub condition: Expr<'a>,
    pub offset: usize,
    pub body: Vec<Node<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IfBlock<'a> {
    pub branches: Vec<Branch<'a>>,
    pub otherwise: Option<Vec<Node<'a>>>,
}

/// Why a block stopped
enum Stop<'a> {
    Eof,
    ElseIf(Expr<'a>, usize),
    Else(usize),
    End(usize),
}

/// Parse a whole template
pub(crate) fn parse(source: &str) -> Result<Vec<Node<'_>>, TemplateError> {
    let mut parser = Parser { source, pos: 0 };
    let (nodes, stop) = parser.block()?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::ElseIf(_, offset) => Err(syntax_error(source, offset, "%elseif without matching %if")),
        Stop::Else(offset) => Err(syntax_error(source, offset, "%else without matching %if")),
        Stop::End(offset) => Err(syntax_error(source, offset, "%end without matching %if")),
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    fn peek(&self, at: usize) -> Option<u8> {
        self.bytes().get(at).copied()
    }

    /// Parse nodes until end of input or a block-closing directive
    fn block(&mut self) -> Result<(Vec<Node<'a>>, Stop<'a>), TemplateError> {
        let source = self.source;
        let mut nodes = Vec::new();
        let mut text_start = self.pos;

        while self.pos < source.len() {
            match (self.peek(self.pos), self.peek(self.pos + 1)) {
                (Some(quote @ (b'\'' | b'"')), _) => {
                    self.pos = self.skip_quoted(self.pos, quote)?;
                }
                (Some(b'-'), Some(b'-')) => {
                    self.pos = source[self.pos..]
                        .find('\n')
                        .map_or(source.len(), |nl| self.pos + nl + 1);
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    let close = source[start + 2..]
                        .find("*/")
                        .map(|i| start + 2 + i)
                        .ok_or_else(|| syntax_error(source, start, "unterminated comment"))?;
                    let content = &source[start + 2..close];
                    self.pos = close + 2;

                    if is_plain_comment(content) {
                        continue;
                    }

                    push_text(&mut nodes, &source[text_start..start]);
                    if let Some(stop) = self.directive(content, start, &mut nodes)? {
                        return Ok((nodes, stop));
                    }
                    text_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }

        push_text(&mut nodes, &source[text_start..]);
        Ok((nodes, Stop::Eof))
    }

    /// Handle one directive comment; returns a stop marker for block ends
    fn directive(
        &mut self,
        content: &'a str,
        offset: usize,
        nodes: &mut Vec<Node<'a>>,
    ) -> Result<Option<Stop<'a>>, TemplateError> {
        if let Some(control) = content.strip_prefix('%') {
            let control = control.trim();
            let (keyword, rest) = control
                .split_once(char::is_whitespace)
                .map_or((control, ""), |(k, r)| (k, r.trim()));
            return match keyword {
                "if" => {
                    let condition = self.condition(rest, offset)?;
                    let block = self.if_block(condition, offset)?;
                    nodes.push(Node::If(block));
                    Ok(None)
                }
                "elseif" => Ok(Some(Stop::ElseIf(self.condition(rest, offset)?, offset))),
                "else" if rest.is_empty() => Ok(Some(Stop::Else(offset))),
                "end" if rest.is_empty() => Ok(Some(Stop::End(offset))),
                _ => Err(syntax_error(
                    self.source,
                    offset,
                    format!("unknown directive '%{control}'"),
                )),
            };
        }

        let (literal, name) = content
            .strip_prefix('^')
            .map_or((false, content), |name| (true, name));
        let name = name.trim();
        if !is_identifier(name) {
            return Err(syntax_error(
                self.source,
                offset,
                format!("invalid variable name '{name}'"),
            ));
        }

        let parenthesized = self.skip_test_literal(name, offset)?;
        let variable = Variable {
            name,
            parenthesized,
            offset,
        };
        nodes.push(if literal {
            Node::Literal(variable)
        } else {
            Node::Bind(variable)
        });
        Ok(None)
    }

    fn condition(&self, text: &'a str, offset: usize) -> Result<Expr<'a>, TemplateError> {
        if text.is_empty() {
            return Err(syntax_error(self.source, offset, "condition expected"));
        }
        expression::parse(text).map_err(|message| {
            syntax_error(
                self.source,
                offset,
                format!("invalid condition '{text}': {message}"),
            )
        })
    }

    fn if_block(&mut self, condition: Expr<'a>, offset: usize) -> Result<IfBlock<'a>, TemplateError> {
        let mut block = IfBlock {
            branches: Vec::new(),
            otherwise: None,
        };
        let mut pending = Some((condition, offset));

        while let Some((condition, branch_offset)) = pending.take() {
            let (body, stop) = self.block()?;
            block.branches.push(Branch {
                condition,
                offset: branch_offset,
                body,
            });
            match stop {
                Stop::ElseIf(next, next_offset) => pending = Some((next, next_offset)),
                Stop::Else(_) => {
                    let (body, stop) = self.block()?;
                    match stop {
                        Stop::End(_) => block.otherwise = Some(body),
                        Stop::Eof => return Err(unclosed(self.source, offset)),
                        Stop::ElseIf(_, at) | Stop::Else(at) => {
                            return Err(syntax_error(
                                self.source,
                                at,
                                "directive after %else must be %end",
                            ))
                        }
                    }
                }
                Stop::End(_) => {}
                Stop::Eof => return Err(unclosed(self.source, offset)),
            }
        }

        Ok(block)
    }

    /// Skip a quoted string or identifier starting at `start`, honoring doubled quotes
    fn skip_quoted(&self, start: usize, quote: u8) -> Result<usize, TemplateError> {
        let mut at = start + 1;
        loop {
            match self.peek(at) {
                None => {
                    return Err(syntax_error(
                        self.source,
                        start,
                        if quote == b'\'' {
                            "unterminated string literal"
                        } else {
                            "unterminated quoted identifier"
                        },
                    ))
                }
                Some(b) if b == quote => {
                    if self.peek(at + 1) == Some(quote) {
                        at += 2;
                    } else {
                        return Ok(at + 1);
                    }
                }
                Some(_) => at += 1,
            }
        }
    }

    /// Drop the test literal following a variable directive
    ///
    /// Returns whether the literal was a parenthesised list.
    fn skip_test_literal(&mut self, name: &str, offset: usize) -> Result<bool, TemplateError> {
        let missing =
            || syntax_error(self.source, offset, format!("variable '{name}' must be followed by a test literal"));

        match self.peek(self.pos) {
            Some(b'\'') => {
                self.pos = self.skip_quoted(self.pos, b'\'')?;
                Ok(false)
            }
            Some(b'(') => {
                self.pos = self.skip_parenthesized(self.pos)?;
                Ok(true)
            }
            Some(b) if !b.is_ascii_whitespace() => {
                let start = self.pos;
                while let Some(b) = self.peek(self.pos) {
                    if b.is_ascii_whitespace() || matches!(b, b')' | b',' | b';' | b'(' | b'\'') {
                        break;
                    }
                    if b == b'/' && self.peek(self.pos + 1) == Some(b'*') {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    Err(missing())
                } else {
                    Ok(false)
                }
            }
            _ => Err(missing()),
        }
    }

    fn skip_parenthesized(&self, start: usize) -> Result<usize, TemplateError> {
        let mut depth = 0usize;
        let mut at = start;
        while let Some(b) = self.peek(at) {
            match b {
                b'\'' | b'"' => {
                    at = self.skip_quoted(at, b)?;
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(at + 1);
                    }
                }
                _ => {}
            }
            at += 1;
        }
        Err(syntax_error(self.source, start, "unbalanced parentheses in test literal"))
    }
}

fn unclosed(source: &str, offset: usize) -> TemplateError {
    syntax_error(source, offset, "%if without matching %end")
}

fn push_text<'a>(nodes: &mut Vec<Node<'a>>, text: &'a str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
}

/// Comments that are not directives: `/**/`, `/* note */`, `/** doc */`, `/*+ hint */`, `/*! ... */`
fn is_plain_comment(content: &str) -> bool {
    match content.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '*' | '+' | '!'),
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
