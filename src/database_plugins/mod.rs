// ABOUTME: Database abstraction layer for executing rendered two-way SQL statements
// ABOUTME: Plugin architecture for database support with SQLite and PostgreSQL backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;

use crate::models::ResultRow;
use crate::template::BoundStatement;

pub mod factory;
pub mod shared;
pub mod sqlite;

#[cfg(feature = "postgresql")]
pub mod postgres;

pub use factory::{Backend, DatabaseType};

/// Rows affected by an insert plus the keys it generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeys {
    /// Number of rows the statement modified
    pub affected_rows: u64,
    /// Generated key of each inserted row
    pub keys: Vec<i64>,
}

/// Core database abstraction trait
///
/// Implementations bind every argument with its declared type and report
/// driver failures as the untouched [`sqlx::Error`].
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Backend kind
    fn database_type(&self) -> DatabaseType;

    /// Run a query and materialize its rows in order
    ///
    /// With `limit`, reading stops once that many rows were received.
    async fn fetch_rows(
        &self,
        stmt: &BoundStatement,
        limit: Option<usize>,
    ) -> Result<Vec<ResultRow>, sqlx::Error>;

    /// Run an insert, update or delete and return the affected-row count
    async fn execute(&self, stmt: &BoundStatement) -> Result<u64, sqlx::Error>;

    /// Run an insert and report the generated values of `key_column`
    async fn execute_returning_key(
        &self,
        stmt: &BoundStatement,
        key_column: &str,
    ) -> Result<GeneratedKeys, sqlx::Error>;
}
