// ABOUTME: PostgreSQL backend executing rendered statements over an sqlx pool
// ABOUTME: Decodes values by their PostgreSQL type into backend-neutral rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `PostgreSQL` backend
//!
//! `NUMERIC`, `TIME` and `JSON`/`JSONB` columns have no dedicated
//! [`SqlValue`] variant and decode to their text form.

use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::info;
use uuid::Uuid;

use super::shared::binding::bind_statement;
use super::shared::rows::{collect_rows, generated_key, returning_sql, unsupported};
use super::{DatabaseType, GeneratedKeys, SqlBackend};
use crate::config::database::{DatabaseUrl, PoolConfig};
use crate::dialect::Dialect;
use crate::models::ResultRow;
use crate::params::SqlValue;
use crate::template::BoundStatement;

/// `PostgreSQL` implementation of [`SqlBackend`]
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Connect to `url` with the configured pool sizing
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails
    pub async fn connect(url: &DatabaseUrl, pool: &PoolConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .min_connections(pool.min_connections)
            .acquire_timeout(pool.acquire_timeout())
            .connect(&url.to_connection_string())
            .await?;
        info!("PostgreSQL pool ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_value(row: &PgRow, index: usize) -> Result<Option<SqlValue>, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }
    let type_name = raw.type_info().name().to_owned();
    let value = match type_name.as_str() {
        "BOOL" => SqlValue::Boolean(row.try_get::<bool, _>(index)?),
        "INT2" => SqlValue::Integer(i32::from(row.try_get::<i16, _>(index)?)),
        "INT4" => SqlValue::Integer(row.try_get::<i32, _>(index)?),
        "INT8" => SqlValue::BigInt(row.try_get::<i64, _>(index)?),
        "FLOAT4" => SqlValue::Double(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => SqlValue::Double(row.try_get::<f64, _>(index)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
            SqlValue::Text(row.try_get::<String, _>(index)?)
        }
        "DATE" => SqlValue::Date(row.try_get::<NaiveDate, _>(index)?),
        "TIMESTAMP" => SqlValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        "TIMESTAMPTZ" => SqlValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(index)?),
        "UUID" => SqlValue::Uuid(row.try_get::<Uuid, _>(index)?),
        "BYTEA" => SqlValue::Bytes(row.try_get::<Vec<u8>, _>(index)?),
        "NUMERIC" => {
            let bytes = row.try_get_unchecked::<&[u8], _>(index)?;
            let text =
                numeric_text(bytes).map_err(|e| unsupported(row.column(index).name(), e))?;
            SqlValue::Text(text)
        }
        "TIME" => SqlValue::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "JSON" | "JSONB" => {
            SqlValue::Text(row.try_get::<serde_json::Value, _>(index)?.to_string())
        }
        other => {
            return Err(unsupported(
                row.column(index).name(),
                format!("unsupported PostgreSQL type {other}"),
            ))
        }
    };
    Ok(Some(value))
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_POS_INF: u16 = 0xD000;
const NUMERIC_NEG_INF: u16 = 0xF000;

/// Render a binary `NUMERIC` as decimal text
///
/// The value is four big-endian 16-bit header words (digit count, weight of
/// the first digit, sign, display scale) followed by base-10000 digits.
fn numeric_text(bytes: &[u8]) -> Result<String, String> {
    let word = |index: usize| -> Result<[u8; 2], String> {
        bytes
            .get(index * 2..index * 2 + 2)
            .and_then(|pair| pair.try_into().ok())
            .ok_or_else(|| format!("NUMERIC value of {} bytes is truncated", bytes.len()))
    };

    let ndigits = usize::from(u16::from_be_bytes(word(0)?));
    let weight = i32::from(i16::from_be_bytes(word(1)?));
    let sign = u16::from_be_bytes(word(2)?);
    let scale = usize::from(u16::from_be_bytes(word(3)?));

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_owned()),
        NUMERIC_POS_INF => return Ok("Infinity".to_owned()),
        NUMERIC_NEG_INF => return Ok("-Infinity".to_owned()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|i| word(4 + i).map(i16::from_be_bytes))
        .collect::<Result<Vec<_>, _>>()?;
    // Positions outside the stored digits are zero groups
    let digit = |position: i32| {
        usize::try_from(position)
            .ok()
            .and_then(|i| digits.get(i))
            .copied()
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&digit(0).to_string());
        for position in 1..=weight {
            write!(text, "{:04}", digit(position)).map_err(|e| e.to_string())?;
        }
    }
    if scale > 0 {
        let mut fraction = String::with_capacity(scale + 3);
        for position in (weight + 1..).take(scale.div_ceil(4)) {
            write!(fraction, "{:04}", digit(position)).map_err(|e| e.to_string())?;
        }
        fraction.truncate(scale);
        text.push('.');
        text.push_str(&fraction);
    }
    Ok(text)
}

#[async_trait]
impl SqlBackend for PostgresBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    async fn fetch_rows(
        &self,
        stmt: &BoundStatement,
        limit: Option<usize>,
    ) -> Result<Vec<ResultRow>, sqlx::Error> {
        let stream = bind_statement::<sqlx::Postgres>(stmt.sql(), stmt).fetch(&self.pool);
        collect_rows(stream, limit, decode_value).await
    }

    async fn execute(&self, stmt: &BoundStatement) -> Result<u64, sqlx::Error> {
        let result = bind_statement::<sqlx::Postgres>(stmt.sql(), stmt)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_returning_key(
        &self,
        stmt: &BoundStatement,
        key_column: &str,
    ) -> Result<GeneratedKeys, sqlx::Error> {
        let sql = returning_sql(stmt.sql(), key_column, Dialect::Postgres);
        let rows = bind_statement::<sqlx::Postgres>(&sql, stmt)
            .fetch_all(&self.pool)
            .await?;
        let keys = rows
            .iter()
            .map(|row| generated_key(key_column, decode_value(row, 0)?.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeneratedKeys {
            affected_rows: rows.len() as u64,
            keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: u16, weight: i16, sign: u16, scale: u16, digits: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(ndigits.to_be_bytes());
        bytes.extend(weight.to_be_bytes());
        bytes.extend(sign.to_be_bytes());
        bytes.extend(scale.to_be_bytes());
        for digit in digits {
            bytes.extend(digit.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(numeric_text(&numeric(3, 1, 0, 3, &[1, 2345, 6780])).unwrap(), "12345.678");
        assert_eq!(numeric_text(&numeric(1, -1, NUMERIC_NEG, 2, &[500])).unwrap(), "-0.05");
        assert_eq!(numeric_text(&numeric(1, 1, 0, 0, &[42])).unwrap(), "420000");
        assert_eq!(numeric_text(&numeric(0, 0, 0, 0, &[])).unwrap(), "0");
        assert_eq!(numeric_text(&numeric(0, 0, 0, 2, &[])).unwrap(), "0.00");
    }

    #[test]
    fn test_numeric_text_special_and_truncated() {
        assert_eq!(numeric_text(&numeric(0, 0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
        assert_eq!(numeric_text(&numeric(0, 0, NUMERIC_NEG_INF, 0, &[])).unwrap(), "-Infinity");
        assert!(numeric_text(&[0, 1]).is_err());
        assert!(numeric_text(&numeric(2, 0, 0, 0, &[7])).is_err());
    }
}
