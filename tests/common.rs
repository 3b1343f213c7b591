// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides test logging, a seeded in-memory employee database and record mappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `twoway_sql`

use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use chrono::NaiveDate;
use twoway_sql::config::database::{DatabaseUrl, PoolConfig};
use twoway_sql::database_plugins::sqlite::SqliteBackend;
use twoway_sql::dialect::Dialect;
use twoway_sql::executor::TwoWayTemplate;
use twoway_sql::mapping::RowMapper;
use twoway_sql::resources::FsResourceLoader;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Directory holding the SQL fixtures under `example/`
pub fn sql_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("sql")
}

/// Employee record used across tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: i32,
    pub name: Option<String>,
    pub joined_date: Option<NaiveDate>,
}

pub fn employee_mapper() -> RowMapper<Employee> {
    RowMapper::builder("Employee")
        .columns(["id", "name", "joined_date"])
        .build(|row| {
            Ok(Employee {
                id: row.get("id")?,
                name: row.get("name")?,
                joined_date: row.get("joined_date")?,
            })
        })
        .expect("employee mapper is valid")
}

/// In-memory `SQLite` with `employee` seeded as Alice (1), Bob (2), Chris (3)
///
/// The id sequence is primed so the next generated id is 100.
pub async fn create_seeded_backend() -> Result<SqliteBackend> {
    init_test_logging();
    let backend = SqliteBackend::connect(&DatabaseUrl::Memory, &PoolConfig::default()).await?;
    let pool = backend.pool();

    sqlx::query(
        r"CREATE TABLE employee (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(32),
            joined_date DATE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"INSERT INTO employee (id, name, joined_date) VALUES
            (1, 'Alice', '2019-04-01'),
            (2, 'Bob', '2020-10-15'),
            (3, 'Chris', NULL)",
    )
    .execute(pool)
    .await?;

    sqlx::query("UPDATE sqlite_sequence SET seq = 99 WHERE name = 'employee'")
        .execute(pool)
        .await?;

    Ok(backend)
}

/// Executor over the seeded database reading fixtures from [`sql_root`]
pub async fn create_test_template() -> Result<TwoWayTemplate<SqliteBackend>> {
    let backend = create_seeded_backend().await?;
    Ok(TwoWayTemplate::builder(backend, Dialect::Sqlite)
        .resource_loader(FsResourceLoader::new([sql_root()]))
        .build())
}
