// ABOUTME: Main library entry point for the two-way SQL template executor
// ABOUTME: Loads SQL resources, binds typed parameters and maps results onto records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # twoway-sql
//!
//! Executes externally stored, parameterized SQL files against a relational
//! database and maps the results onto typed records.
//!
//! Each call runs one pipeline:
//!
//! 1. a [`resources::ResourceLoader`] fetches the SQL text by logical path
//! 2. the named, typed [`params::SqlParam`] list is validated
//! 3. a [`template::TemplateEngine`] binds the parameters into the two-way SQL
//! 4. a [`database_plugins::SqlBackend`] runs the bound statement through sqlx
//! 5. rows are mapped with a [`mapping::RowMapper`], or the affected-row count
//!    and generated key are returned
//!
//! ## Example
//!
//! ```rust,no_run
//! use twoway_sql::config::TemplateConfig;
//! use twoway_sql::errors::TwoWayResult;
//! use twoway_sql::mapping::RowMapper;
//! use twoway_sql::params::SqlParam;
//!
//! #[derive(Debug)]
//! struct Employee {
//!     id: i32,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> TwoWayResult<()> {
//!     let template = TemplateConfig::from_env()?.connect().await?;
//!     let mapper = RowMapper::builder("Employee")
//!         .columns(["id", "name"])
//!         .build(|row| {
//!             Ok(Employee {
//!                 id: row.get("id")?,
//!                 name: row.get("name")?,
//!             })
//!         })?;
//!
//!     let employee = template
//!         .query_one("example/selectEmployeeById.sql", &mapper, &[SqlParam::new("id", 2)])
//!         .await?;
//!     println!("{employee:?}");
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// Configuration keys and defaults
pub mod constants;

/// Backends executing bound statements
pub mod database_plugins;

/// Placeholder and literal rules per database
pub mod dialect;

/// Error taxonomy
pub mod errors;

/// Statement executor
pub mod executor;

/// Logging setup
pub mod logging;

/// Row to record mapping
pub mod mapping;

/// Result types
pub mod models;

/// Executed-SQL tracing port
pub mod observability;

/// Named, typed parameters
pub mod params;

/// SQL resource loaders
pub mod resources;

/// Two-way SQL template engine
pub mod template;

pub use errors::{TwoWayError, TwoWayResult};
pub use executor::TwoWayTemplate;
pub use mapping::RowMapper;
pub use models::UpdateOutcome;
pub use params::SqlParam;
