// ABOUTME: Result-row helpers shared by the SQLite and PostgreSQL backends
// ABOUTME: Row streaming, RETURNING clause rewriting and generated key conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use futures_util::{Stream, TryStreamExt};
use sqlx::{Column, Row};

use crate::dialect::Dialect;
use crate::models::ResultRow;
use crate::params::SqlValue;

/// Column names of `row` in result order
#[must_use]
pub fn column_names<R: Row>(row: &R) -> Arc<[String]> {
    row.columns()
        .iter()
        .map(|column| column.name().to_owned())
        .collect()
}

/// Drain `stream` into decoded rows, stopping after `limit` rows
///
/// Column names are read once from the first row and shared by every row.
///
/// # Errors
///
/// Returns the first driver or decode error
pub async fn collect_rows<R, S, F>(
    mut stream: S,
    limit: Option<usize>,
    decode_value: F,
) -> Result<Vec<ResultRow>, sqlx::Error>
where
    R: Row,
    S: Stream<Item = Result<R, sqlx::Error>> + Unpin + Send,
    F: Fn(&R, usize) -> Result<Option<SqlValue>, sqlx::Error> + Send,
{
    let mut columns: Option<Arc<[String]>> = None;
    let mut rows = Vec::new();

    while let Some(row) = stream.try_next().await? {
        let names = columns.get_or_insert_with(|| column_names(&row));
        let values = (0..names.len())
            .map(|i| decode_value(&row, i))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(ResultRow::new(Arc::clone(names), values));
        if limit.is_some_and(|max| rows.len() >= max) {
            break;
        }
    }
    Ok(rows)
}

/// Append `RETURNING "<key_column>"` to an insert
///
/// Trailing whitespace, comments and semicolons are dropped first so the
/// clause never lands inside a `--` comment or after the statement end.
#[must_use]
pub fn returning_sql(sql: &str, key_column: &str, dialect: Dialect) -> String {
    let body = &sql[..statement_end(sql)];
    format!("{body} RETURNING {}", dialect.quote_identifier(key_column))
}

#[derive(Clone, Copy)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Byte offset just past the last character of `sql` that is not
/// whitespace, a comment or a semicolon
fn statement_end(sql: &str) -> usize {
    let mut state = Scan::Code;
    let mut end = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match state {
            Scan::Code => match c {
                '\'' | '"' => {
                    state = Scan::Quoted(c);
                    end = i + 1;
                }
                '-' if next == Some('-') => {
                    chars.next();
                    state = Scan::LineComment;
                }
                '/' if next == Some('*') => {
                    chars.next();
                    state = Scan::BlockComment;
                }
                c if c == ';' || c.is_whitespace() => {}
                c => end = i + c.len_utf8(),
            },
            Scan::Quoted(quote) => {
                end = i + c.len_utf8();
                if c == quote {
                    state = Scan::Code;
                }
            }
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    state = Scan::Code;
                }
            }
        }
    }
    end
}

/// Convert a decoded key value into an `i64` key
///
/// # Errors
///
/// Returns `sqlx::Error::ColumnDecode` for NULL or non-integer keys
pub fn generated_key(key_column: &str, value: Option<&SqlValue>) -> Result<i64, sqlx::Error> {
    value.and_then(SqlValue::as_i64).ok_or_else(|| {
        let found = value.map_or_else(|| "NULL".to_owned(), |v| v.sql_type().to_string());
        unsupported(
            key_column,
            format!("generated key is {found}, expected an integer"),
        )
    })
}

/// Decode failure for a column
#[must_use]
pub fn unsupported(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returning_sql() {
        assert_eq!(
            returning_sql("INSERT INTO t (a) VALUES (?);\n", "id", Dialect::Sqlite),
            "INSERT INTO t (a) VALUES (?) RETURNING \"id\""
        );
    }

    #[test]
    fn test_returning_sql_skips_trailing_comments() {
        assert_eq!(
            returning_sql(
                "INSERT INTO t (a)\nVALUES ($1) -- one row\n",
                "id",
                Dialect::Postgres
            ),
            "INSERT INTO t (a)\nVALUES ($1) RETURNING \"id\""
        );
        assert_eq!(
            returning_sql(
                "INSERT INTO t (a) VALUES (?); /* done */ -- really\n\n",
                "id",
                Dialect::Sqlite
            ),
            "INSERT INTO t (a) VALUES (?) RETURNING \"id\""
        );
    }

    #[test]
    fn test_returning_sql_keeps_literals_and_inner_comments() {
        assert_eq!(
            returning_sql(
                "INSERT INTO t (a, b) -- columns\nVALUES ('x -- y;', ?)",
                "id",
                Dialect::Sqlite
            ),
            "INSERT INTO t (a, b) -- columns\nVALUES ('x -- y;', ?) RETURNING \"id\""
        );
        assert_eq!(
            returning_sql("INSERT INTO t (a) VALUES ('it''s');", "id", Dialect::Sqlite),
            "INSERT INTO t (a) VALUES ('it''s') RETURNING \"id\""
        );
    }

    #[test]
    fn test_generated_key() {
        assert_eq!(generated_key("id", Some(&SqlValue::Integer(7))).unwrap(), 7);
        assert_eq!(generated_key("id", Some(&SqlValue::BigInt(100))).unwrap(), 100);
        assert!(matches!(
            generated_key("id", None),
            Err(sqlx::Error::ColumnDecode { .. })
        ));
        assert!(generated_key("id", Some(&SqlValue::Double(1.5))).is_err());
    }
}
