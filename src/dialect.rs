// ABOUTME: SQL dialect rules used when rendering two-way SQL templates
// ABOUTME: Covers placeholder syntax, identifier quoting and literal formatting per database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::database::DatabaseUrl;
use crate::params::SqlValue;

/// Database product specific rendering rules, fixed per template instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `SQLite`: `?` placeholders, integer booleans, `X'..'` blobs
    Sqlite,
    /// `PostgreSQL`: `$n` placeholders, `TRUE`/`FALSE`, `'\x..'::bytea` blobs
    Postgres,
}

impl Dialect {
    /// Dialect matching a database URL
    #[must_use]
    pub const fn for_url(url: &DatabaseUrl) -> Self {
        if url.is_postgresql() {
            Self::Postgres
        } else {
            Self::Sqlite
        }
    }

    /// Stable lowercase name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Placeholder for the argument at one-based `position`
    #[must_use]
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Sqlite => "?".to_owned(),
            Self::Postgres => format!("${position}"),
        }
    }

    /// Quote an identifier, doubling embedded quotes
    #[must_use]
    pub fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Render a value as an inline SQL literal
    ///
    /// Used for literal variables and the diagnostic rendering of bound
    /// statements; bound execution never goes through this path.
    #[must_use]
    pub fn format_literal(&self, value: Option<&SqlValue>) -> String {
        let Some(value) = value else {
            return "NULL".to_owned();
        };
        match (self, value) {
            (Self::Sqlite, SqlValue::Boolean(b)) => String::from(if *b { "1" } else { "0" }),
            (Self::Postgres, SqlValue::Boolean(b)) => String::from(if *b { "TRUE" } else { "FALSE" }),
            (_, SqlValue::Integer(v)) => v.to_string(),
            (_, SqlValue::BigInt(v)) => v.to_string(),
            (_, SqlValue::Double(v)) => v.to_string(),
            (Self::Sqlite, SqlValue::Bytes(bytes)) => format!("X'{}'", hex::encode(bytes)),
            (Self::Postgres, SqlValue::Bytes(bytes)) => {
                format!("'\\x{}'::bytea", hex::encode(bytes))
            }
            (_, other) => quote_string(&other.to_string()),
        }
    }
}

fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(format!("unknown SQL dialect '{other}'")),
        }
    }
}
