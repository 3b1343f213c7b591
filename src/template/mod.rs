// ABOUTME: Two-way SQL template engine contract and the built-in comment-directive engine
// ABOUTME: Turns SQL text with embedded bind comments into positional SQL plus typed arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Two-Way SQL Templates
//!
//! A two-way SQL file stays runnable in a database console because every
//! directive lives in a comment and is followed by a *test literal*:
//!
//! ```sql
//! SELECT id, name
//!   FROM employee
//!  WHERE id = /*id*/1
//! /*%if name != null*/
//!    AND name = /*name*/'Bob'
//! /*%end*/
//! ```
//!
//! The executor only depends on the [`TemplateEngine`] trait. [`TwoWaySqlEngine`]
//! implements the directive set below; other engines can be plugged in through
//! [`crate::executor::TwoWayTemplateBuilder::template_engine`].
//!
//! | Directive | Rendering |
//! |---|---|
//! | `/*name*/test` | placeholder bound to `name`, test literal dropped |
//! | `/*names*/(1, 2)` | one placeholder per list element |
//! | `/*^name*/test` | value inlined as a dialect literal |
//! | `/*%if expr*/`, `/*%elseif expr*/`, `/*%else*/`, `/*%end*/` | conditional blocks |
//!
//! Comments starting with whitespace, `*`, `+` or `!` are ordinary comments.

mod expression;
mod parser;
mod renderer;

use serde::Serialize;

use crate::dialect::Dialect;
use crate::errors::TemplateError;
use crate::params::{SqlParam, SqlType, SqlValue};

/// One positional argument of a bound statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlArgument {
    /// Parameter the argument came from
    pub name: String,
    /// Declared SQL type, used for typed NULL binding
    pub sql_type: SqlType,
    /// Value, `None` for SQL NULL
    pub value: Option<SqlValue>,
}

/// Final SQL plus ordered arguments, produced once per call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundStatement {
    sql: String,
    formatted_sql: String,
    arguments: Vec<SqlArgument>,
}

impl BoundStatement {
    /// Assemble a bound statement
    ///
    /// `formatted_sql` is the diagnostic form with every argument inlined.
    #[must_use]
    pub fn new(sql: String, formatted_sql: String, arguments: Vec<SqlArgument>) -> Self {
        Self {
            sql,
            formatted_sql,
            arguments,
        }
    }

    /// SQL with positional placeholders, sent to the driver
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// SQL with arguments inlined, for diagnostics only
    #[must_use]
    pub fn formatted_sql(&self) -> &str {
        &self.formatted_sql
    }

    /// Ordered arguments matching the placeholders
    #[must_use]
    pub fn arguments(&self) -> &[SqlArgument] {
        &self.arguments
    }
}

/// Converts raw two-way SQL plus named parameters into a [`BoundStatement`]
pub trait TemplateEngine: Send + Sync {
    /// Dialect chosen at construction
    fn dialect(&self) -> Dialect;

    /// Bind `params` into `template`
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Syntax` for malformed directives and
    /// `TemplateError::UnresolvedParameter` when a directive names a
    /// parameter that was not supplied
    fn render(&self, template: &str, params: &[SqlParam]) -> Result<BoundStatement, TemplateError>;
}

/// Built-in two-way SQL engine
#[derive(Debug, Clone, Copy)]
pub struct TwoWaySqlEngine {
    dialect: Dialect,
}

impl TwoWaySqlEngine {
    /// Create an engine rendering for `dialect`
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl TemplateEngine for TwoWaySqlEngine {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn render(&self, template: &str, params: &[SqlParam]) -> Result<BoundStatement, TemplateError> {
        let nodes = parser::parse(template)?;
        renderer::render(template, &nodes, params, self.dialect)
    }
}

/// One-based line and column of a byte offset
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before, |nl| &before[nl + 1..])
        .chars()
        .count()
        + 1;
    (line, column)
}

pub(crate) fn syntax_error(source: &str, offset: usize, message: impl Into<String>) -> TemplateError {
    let (line, column) = line_column(source, offset);
    TemplateError::Syntax {
        message: message.into(),
        line,
        column,
    }
}

pub(crate) fn unresolved(source: &str, offset: usize, name: &str) -> TemplateError {
    let (line, column) = line_column(source, offset);
    TemplateError::UnresolvedParameter {
        name: name.to_owned(),
        line,
        column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let src = "SELECT 1\n  FROM t\n WHERE x = /*x*/1";
        assert_eq!(line_column(src, 0), (1, 1));
        assert_eq!(line_column(src, 9), (2, 1));
        let offset = src.find("/*x*/").unwrap();
        assert_eq!(line_column(src, offset), (3, 12));
    }
}
