// ABOUTME: Database factory and backend dispatch for multi-database support
// ABOUTME: Selects the SQLite or PostgreSQL backend at runtime from the database URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Database factory for creating backends
//!
//! This module provides database type detection and creation based on
//! connection strings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "postgresql")]
use super::postgres::PostgresBackend;
use super::sqlite::SqliteBackend;
use super::{GeneratedKeys, SqlBackend};
use crate::config::database::{DatabaseUrl, PoolConfig};
use crate::dialect::Dialect;
use crate::errors::{ConfigError, TwoWayResult};
use crate::models::ResultRow;
use crate::template::BoundStatement;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
    /// Embedded `SQLite`
    SQLite,
    /// Client-server `PostgreSQL`
    PostgreSQL,
}

impl DatabaseType {
    /// Dialect templates for this backend are rendered in
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        match self {
            Self::SQLite => Dialect::Sqlite,
            Self::PostgreSQL => Dialect::Postgres,
        }
    }
}

/// Backend wrapper that delegates to the appropriate implementation
#[derive(Debug, Clone)]
pub enum Backend {
    /// `SQLite` pool
    SQLite(SqliteBackend),
    /// `PostgreSQL` pool
    #[cfg(feature = "postgresql")]
    PostgreSQL(PostgresBackend),
}

impl Backend {
    /// Get a descriptive string for the current database backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::SQLite(_) => "SQLite",
            #[cfg(feature = "postgresql")]
            Self::PostgreSQL(_) => "PostgreSQL",
        }
    }

    /// Connect to the database named by `url`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PostgreSQL` feature is not enabled when a `PostgreSQL` URL is provided
    /// - Database connection fails
    pub async fn connect(url: &DatabaseUrl, pool: &PoolConfig) -> TwoWayResult<Self> {
        let db_type = detect_database_type(url)?;
        debug!(?db_type, "Detected database type");

        match db_type {
            DatabaseType::SQLite => {
                let backend = SqliteBackend::connect(url, pool).await?;
                info!("SQLite backend initialized");
                Ok(Self::SQLite(backend))
            }
            #[cfg(feature = "postgresql")]
            DatabaseType::PostgreSQL => {
                let backend = PostgresBackend::connect(url, pool).await?;
                info!("PostgreSQL backend initialized");
                Ok(Self::PostgreSQL(backend))
            }
            #[cfg(not(feature = "postgresql"))]
            DatabaseType::PostgreSQL => Err(ConfigError::UnsupportedDatabase(
                "PostgreSQL support not enabled; enable the 'postgresql' feature".to_owned(),
            )
            .into()),
        }
    }
}

/// Detect the database type of a parsed URL
///
/// # Errors
///
/// Returns an error if a `PostgreSQL` URL is given without the
/// `postgresql` feature
pub fn detect_database_type(url: &DatabaseUrl) -> Result<DatabaseType, ConfigError> {
    if url.is_sqlite() {
        Ok(DatabaseType::SQLite)
    } else if cfg!(feature = "postgresql") {
        Ok(DatabaseType::PostgreSQL)
    } else {
        Err(ConfigError::UnsupportedDatabase(format!(
            "{url} (PostgreSQL support not enabled; enable the 'postgresql' feature)"
        )))
    }
}

#[async_trait]
impl SqlBackend for Backend {
    fn database_type(&self) -> DatabaseType {
        match self {
            Self::SQLite(db) => db.database_type(),
            #[cfg(feature = "postgresql")]
            Self::PostgreSQL(db) => db.database_type(),
        }
    }

    async fn fetch_rows(
        &self,
        stmt: &BoundStatement,
        limit: Option<usize>,
    ) -> Result<Vec<ResultRow>, sqlx::Error> {
        match self {
            Self::SQLite(db) => db.fetch_rows(stmt, limit).await,
            #[cfg(feature = "postgresql")]
            Self::PostgreSQL(db) => db.fetch_rows(stmt, limit).await,
        }
    }

    async fn execute(&self, stmt: &BoundStatement) -> Result<u64, sqlx::Error> {
        match self {
            Self::SQLite(db) => db.execute(stmt).await,
            #[cfg(feature = "postgresql")]
            Self::PostgreSQL(db) => db.execute(stmt).await,
        }
    }

    async fn execute_returning_key(
        &self,
        stmt: &BoundStatement,
        key_column: &str,
    ) -> Result<GeneratedKeys, sqlx::Error> {
        match self {
            Self::SQLite(db) => db.execute_returning_key(stmt, key_column).await,
            #[cfg(feature = "postgresql")]
            Self::PostgreSQL(db) => db.execute_returning_key(stmt, key_column).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_database_type() {
        let memory = DatabaseUrl::Memory;
        assert_eq!(detect_database_type(&memory).unwrap(), DatabaseType::SQLite);
        assert_eq!(DatabaseType::SQLite.dialect(), Dialect::Sqlite);

        let pg = DatabaseUrl::parse_url("postgres://localhost/app").unwrap();
        assert_eq!(
            detect_database_type(&pg).is_ok(),
            cfg!(feature = "postgresql")
        );
    }
}
