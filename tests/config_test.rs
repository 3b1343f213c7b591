// ABOUTME: Integration tests for environment-driven configuration
// ABOUTME: Serialized because every test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::env;
use std::path::PathBuf;

use serial_test::serial;
use twoway_sql::config::database::{DatabaseUrl, PoolConfig};
use twoway_sql::config::TemplateConfig;
use twoway_sql::dialect::Dialect;
use twoway_sql::errors::{ConfigError, ErrorCode, TwoWayError};
use twoway_sql::mapping::RowMapper;
use twoway_sql::params::SqlParam;

const KEYS: [&str; 7] = [
    "DATABASE_URL",
    "TWOWAY_SQL_DIALECT",
    "TWOWAY_SQL_ROOTS",
    "TWOWAY_SQL_CACHE",
    "DB_MAX_CONNECTIONS",
    "DB_MIN_CONNECTIONS",
    "DB_ACQUIRE_TIMEOUT_SECS",
];

fn clear_env() {
    for key in KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    let config = TemplateConfig::from_env().unwrap();
    assert_eq!(config, TemplateConfig::default());
    assert_eq!(config.database_url, DatabaseUrl::Memory);
    assert_eq!(config.dialect, Dialect::Sqlite);
    assert_eq!(config.sql_roots, [PathBuf::from("sql")]);
    assert_eq!(config.pool, PoolConfig::default());
}

#[test]
#[serial]
fn test_dialect_follows_url_unless_overridden() {
    clear_env();
    env::set_var("DATABASE_URL", "postgres://localhost/app");
    assert_eq!(TemplateConfig::from_env().unwrap().dialect, Dialect::Postgres);

    env::set_var("TWOWAY_SQL_DIALECT", "sqlite");
    assert_eq!(TemplateConfig::from_env().unwrap().dialect, Dialect::Sqlite);

    env::set_var("TWOWAY_SQL_DIALECT", "oracle");
    let err = TemplateConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "TWOWAY_SQL_DIALECT", .. }));
    clear_env();
}

#[test]
#[serial]
fn test_roots_cache_and_pool() {
    clear_env();
    let roots = env::join_paths(["first", "second"]).unwrap();
    env::set_var("TWOWAY_SQL_ROOTS", roots);
    env::set_var("TWOWAY_SQL_CACHE", "true");
    env::set_var("DB_MAX_CONNECTIONS", "4");
    env::set_var("DB_MIN_CONNECTIONS", "1");
    env::set_var("DB_ACQUIRE_TIMEOUT_SECS", "5");

    let config = TemplateConfig::from_env().unwrap();
    assert_eq!(config.sql_roots, [PathBuf::from("first"), PathBuf::from("second")]);
    assert!(config.cache_resources);
    assert_eq!(
        config.pool,
        PoolConfig {
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 5,
        }
    );
    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    clear_env();
    env::set_var("DB_MAX_CONNECTIONS", "many");
    assert!(matches!(
        TemplateConfig::from_env(),
        Err(ConfigError::InvalidValue { key: "DB_MAX_CONNECTIONS", .. })
    ));

    env::set_var("DB_MAX_CONNECTIONS", "2");
    env::set_var("DB_MIN_CONNECTIONS", "3");
    assert!(matches!(
        TemplateConfig::from_env(),
        Err(ConfigError::InvalidValue { key: "DB_MIN_CONNECTIONS", .. })
    ));

    clear_env();
    env::set_var("DATABASE_URL", "mysql://localhost/app");
    assert!(matches!(
        TemplateConfig::from_env(),
        Err(ConfigError::UnsupportedDatabase(_))
    ));
    clear_env();
}

#[tokio::test]
#[serial]
async fn test_connect_builds_working_executor() {
    clear_env();
    let config = TemplateConfig {
        sql_roots: vec![common::sql_root()],
        cache_resources: true,
        ..TemplateConfig::default()
    };
    let template = config.connect().await.unwrap();

    let answer = RowMapper::<i64>::scalar("id").unwrap();
    let err = template
        .query_one("example/selectEmployeeById.sql", &answer, &[SqlParam::new("id", 1)])
        .await
        .unwrap_err();
    // Fresh in-memory database has no employee table
    assert!(matches!(err, TwoWayError::Database(_)));
    assert_eq!(err.code(), ErrorCode::DatabaseError);
}
