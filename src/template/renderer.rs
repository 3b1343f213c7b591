// ABOUTME: Renders parsed two-way SQL into dialect placeholders and ordered typed arguments
// ABOUTME: Expands list parameters, inlines literal variables and evaluates conditional blocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

use super::expression::Probe;
use super::parser::{IfBlock, Node, Variable};
use super::{syntax_error, unresolved, BoundStatement, SqlArgument};
use crate::dialect::Dialect;
use crate::errors::TemplateError;
use crate::params::{ParamValue, SqlParam, SqlValue};

struct Renderer<'p, 's> {
    source: &'s str,
    dialect: Dialect,
    params: HashMap<&'p str, &'p SqlParam>,
    sql: String,
    formatted: String,
    arguments: Vec<SqlArgument>,
}

/// Render parsed nodes with `params`
pub(crate) fn render(
    source: &str,
    nodes: &[Node<'_>],
    params: &[SqlParam],
    dialect: Dialect,
) -> Result<BoundStatement, TemplateError> {
    let mut renderer = Renderer {
        source,
        dialect,
        params: params.iter().map(|p| (p.name(), p)).collect(),
        sql: String::with_capacity(source.len()),
        formatted: String::with_capacity(source.len()),
        arguments: Vec::new(),
    };
    renderer.nodes(nodes)?;
    Ok(BoundStatement::new(
        renderer.sql,
        renderer.formatted,
        renderer.arguments,
    ))
}

impl<'p> Renderer<'p, '_> {
    fn nodes(&mut self, nodes: &[Node<'_>]) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.push(text),
                Node::Bind(variable) => self.bind(variable)?,
                Node::Literal(variable) => self.literal(variable)?,
                Node::If(block) => self.conditional(block)?,
            }
        }
        Ok(())
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
        self.formatted.push_str(text);
    }

    fn param(&self, variable: &Variable<'_>) -> Result<&'p SqlParam, TemplateError> {
        self.params
            .get(variable.name)
            .copied()
            .ok_or_else(|| unresolved(self.source, variable.offset, variable.name))
    }

    fn bind(&mut self, variable: &Variable<'_>) -> Result<(), TemplateError> {
        let param = self.param(variable)?;
        match param.value() {
            ParamValue::List(values) => {
                if !variable.parenthesized {
                    return Err(syntax_error(
                        self.source,
                        variable.offset,
                        format!(
                            "list parameter '{}' needs a parenthesised test literal",
                            variable.name
                        ),
                    ));
                }
                if values.is_empty() {
                    self.push("(NULL)");
                    return Ok(());
                }
                self.push("(");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.placeholder(param, Some(value));
                }
                self.push(")");
            }
            ParamValue::Single(value) => self.wrapped(variable, |r| r.placeholder(param, Some(value))),
            ParamValue::Null => self.wrapped(variable, |r| r.placeholder(param, None)),
        }
        Ok(())
    }

    fn literal(&mut self, variable: &Variable<'_>) -> Result<(), TemplateError> {
        let param = self.param(variable)?;
        let value = match param.value() {
            ParamValue::List(_) => {
                return Err(syntax_error(
                    self.source,
                    variable.offset,
                    format!("literal variable '{}' cannot hold a list", variable.name),
                ))
            }
            ParamValue::Single(value) => Some(value),
            ParamValue::Null => None,
        };
        let literal = self.dialect.format_literal(value);
        self.wrapped(variable, |r| r.push(&literal));
        Ok(())
    }

    fn wrapped(&mut self, variable: &Variable<'_>, body: impl FnOnce(&mut Self)) {
        if variable.parenthesized {
            self.push("(");
            body(self);
            self.push(")");
        } else {
            body(self);
        }
    }

    fn placeholder(&mut self, param: &SqlParam, value: Option<&SqlValue>) {
        self.arguments.push(SqlArgument {
            name: param.name().to_owned(),
            sql_type: param.sql_type(),
            value: value.cloned(),
        });
        self.sql.push_str(&self.dialect.placeholder(self.arguments.len()));
        self.formatted.push_str(&self.dialect.format_literal(value));
    }

    fn conditional(&mut self, block: &IfBlock<'_>) -> Result<(), TemplateError> {
        for branch in &block.branches {
            let offset = branch.offset;
            let holds = branch
                .condition
                .eval(&|name, probe| self.probe(name, probe, offset))?;
            if holds {
                return self.nodes(&branch.body);
            }
        }
        if let Some(otherwise) = &block.otherwise {
            self.nodes(otherwise)?;
        }
        Ok(())
    }

    fn probe(&self, name: &str, probe: Probe, offset: usize) -> Result<bool, TemplateError> {
        let param = self
            .params
            .get(name)
            .ok_or_else(|| unresolved(self.source, offset, name))?;
        match (probe, param.value()) {
            (Probe::IsNull, value) => Ok(matches!(value, ParamValue::Null)),
            (Probe::Truth, ParamValue::Single(SqlValue::Boolean(b))) => Ok(*b),
            (Probe::Truth, _) => Err(syntax_error(
                self.source,
                offset,
                format!("condition parameter '{name}' is not a non-null boolean"),
            )),
        }
    }
}
