// ABOUTME: SQLite backend executing rendered statements over an sqlx pool
// ABOUTME: Decodes values by their runtime storage class into backend-neutral rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `SQLite` backend
//!
//! `SQLite` values carry one of five storage classes regardless of the
//! declared column type, so decoding follows the runtime class: INTEGER,
//! REAL, TEXT, BLOB or NULL. Dates, timestamps and booleans come back as
//! TEXT or INTEGER and are converted by the row mapper.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use tracing::info;

use super::shared::binding::bind_statement;
use super::shared::rows::{collect_rows, generated_key, returning_sql, unsupported};
use super::{DatabaseType, GeneratedKeys, SqlBackend};
use crate::config::database::{DatabaseUrl, PoolConfig};
use crate::dialect::Dialect;
use crate::models::ResultRow;
use crate::params::SqlValue;
use crate::template::BoundStatement;

/// `SQLite` implementation of [`SqlBackend`]
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Connect to `url`, creating the database file if needed
    ///
    /// An in-memory database lives only as long as its connection, so the
    /// pool is pinned to one connection that never idles out or expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails
    pub async fn connect(url: &DatabaseUrl, pool: &PoolConfig) -> Result<Self, sqlx::Error> {
        let options =
            SqliteConnectOptions::from_str(&url.to_connection_string())?.create_if_missing(true);

        let pool_options = if url.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
        };

        let pool = pool_options
            .acquire_timeout(pool.acquire_timeout())
            .connect_with(options)
            .await?;
        info!(database = %url, "SQLite pool ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Decode column `index` by its runtime storage class
fn decode_value(row: &SqliteRow, index: usize) -> Result<Option<SqlValue>, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT4" | "INT8" | "BIGINT" | "BOOLEAN" => {
            SqlValue::BigInt(row.try_get_unchecked::<i64, _>(index)?)
        }
        "REAL" | "NUMERIC" => SqlValue::Double(row.try_get_unchecked::<f64, _>(index)?),
        "TEXT" | "DATE" | "TIME" | "DATETIME" => {
            SqlValue::Text(row.try_get_unchecked::<String, _>(index)?)
        }
        "BLOB" => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        other => {
            return Err(unsupported(
                row.column(index).name(),
                format!("unsupported SQLite value type {other}"),
            ))
        }
    };
    Ok(Some(value))
}

#[async_trait]
impl SqlBackend for SqliteBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn fetch_rows(
        &self,
        stmt: &BoundStatement,
        limit: Option<usize>,
    ) -> Result<Vec<ResultRow>, sqlx::Error> {
        let stream = bind_statement::<sqlx::Sqlite>(stmt.sql(), stmt).fetch(&self.pool);
        collect_rows(stream, limit, decode_value).await
    }

    async fn execute(&self, stmt: &BoundStatement) -> Result<u64, sqlx::Error> {
        let result = bind_statement::<sqlx::Sqlite>(stmt.sql(), stmt)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_returning_key(
        &self,
        stmt: &BoundStatement,
        key_column: &str,
    ) -> Result<GeneratedKeys, sqlx::Error> {
        let sql = returning_sql(stmt.sql(), key_column, Dialect::Sqlite);
        let rows = bind_statement::<sqlx::Sqlite>(&sql, stmt)
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
