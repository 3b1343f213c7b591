// ABOUTME: Integration tests for the two-way SQL executor against in-memory SQLite
// ABOUTME: Covers row cardinality, typed NULL binding, generated keys, error layering and tracing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{create_test_template, employee_mapper, Employee};
use twoway_sql::database_plugins::{DatabaseType, GeneratedKeys, SqlBackend};
use twoway_sql::dialect::Dialect;
use twoway_sql::errors::{ErrorCode, MappingError, TwoWayError};
use twoway_sql::executor::TwoWayTemplate;
use twoway_sql::mapping::RowMapper;
use twoway_sql::models::{ResultRow, UpdateOutcome};
use twoway_sql::observability::{SqlTrace, SqlTracer};
use twoway_sql::params::SqlParam;
use twoway_sql::resources::{EmbeddedResourceLoader, FsResourceLoader};
use twoway_sql::template::BoundStatement;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_query_one_selects_employee_by_id() -> Result<()> {
    let template = create_test_template().await?;

    let bob = template
        .query_one(
            "example/selectEmployeeById.sql",
            &employee_mapper(),
            &[SqlParam::new("id", 2)],
        )
        .await?;

    assert_eq!(
        bob,
        Employee {
            id: 2,
            name: Some("Bob".into()),
            joined_date: Some(date(2020, 10, 15)),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_query_one_cardinality_errors() -> Result<()> {
    let template = create_test_template().await?;
    let mapper = employee_mapper();

    let err = template
        .query_one("example/selectEmployeeById.sql", &mapper, &[SqlParam::new("id", 42)])
        .await
        .unwrap_err();
    assert!(matches!(&err, TwoWayError::NoResult { path } if path == "example/selectEmployeeById.sql"));
    assert_eq!(err.code(), ErrorCode::NoResult);

    let err = template
        .query_one(
            "example/selectEmployees.sql",
            &mapper,
            &[SqlParam::null::<String>("name")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TwoWayError::MultipleResults { .. }));
    Ok(())
}

#[tokio::test]
async fn test_query_many_orders_and_filters() -> Result<()> {
    let template = create_test_template().await?;
    let mapper = employee_mapper();

    let all = template
        .query_many("example/selectEmployees.sql", &mapper, &[SqlParam::null::<String>("name")])
        .await?;
    let names: Vec<_> = all.iter().map(|e| e.name.as_deref().unwrap()).collect();
    assert_eq!(names, ["Alice", "Bob", "Chris"]);
    assert_eq!(all[2].joined_date, None);

    let chris = template
        .query_many("example/selectEmployees.sql", &mapper, &[SqlParam::new("name", "Chris")])
        .await?;
    assert_eq!(chris.len(), 1);
    assert_eq!(chris[0].id, 3);

    let nobody = template
        .query_many("example/selectEmployees.sql", &mapper, &[SqlParam::new("name", "Nobody")])
        .await?;
    assert!(nobody.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_query_many_expands_in_list() -> Result<()> {
    let template = create_test_template().await?;
    let ids = RowMapper::<i64>::scalar("id")?;

    let found = template
        .query_many(
            "example/selectEmployeesByIds.sql",
            &ids,
            &[SqlParam::list("ids", [1, 3])],
        )
        .await?;
    assert_eq!(found, [1, 3]);

    let none = template
        .query_many(
            "example/selectEmployeesByIds.sql",
            &ids,
            &[SqlParam::list::<i32, _>("ids", [])],
        )
        .await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_execute_binds_typed_nulls() -> Result<()> {
    let template = create_test_template().await?;

    let updated = template
        .execute(
            "example/updateEmployeeById.sql",
            &[
                SqlParam::null::<String>("name"),
                SqlParam::null::<NaiveDate>("joined_date"),
                SqlParam::new("id", 2),
            ],
        )
        .await?;
    assert_eq!(updated, 1);

    let bob = template
        .query_one(
            "example/selectEmployeeById.sql",
            &employee_mapper(),
            &[SqlParam::new("id", 2)],
        )
        .await?;
    assert_eq!(bob.name, None);
    assert_eq!(bob.joined_date, None);
    Ok(())
}

#[tokio::test]
async fn test_execute_reports_affected_rows() -> Result<()> {
    let template = create_test_template().await?;

    let missing = template
        .execute(
            "example/updateEmployeeById.sql",
            &[
                SqlParam::new("name", "Dave"),
                SqlParam::nullable::<NaiveDate>("joined_date", None),
                SqlParam::new("id", 404),
            ],
        )
        .await?;
    assert_eq!(missing, 0);

    let deleted = template
        .execute(
            "example/deleteEmployeesByIds.sql",
            &[SqlParam::list("ids", [1_i64, 2])],
        )
        .await?;
    assert_eq!(deleted, 2);
    Ok(())
}

#[tokio::test]
async fn test_execute_returning_key() -> Result<()> {
    let template = create_test_template().await?;

    let outcome = template
        .execute_returning_key(
            "example/insertEmployee.sql",
            "id",
            &[
                SqlParam::new("name", "John Doe"),
                SqlParam::new("joined_date", date(2022, 12, 31)),
            ],
        )
        .await?;
    assert_eq!(
        outcome,
        UpdateOutcome {
            affected_rows: 1,
            generated_key: Some(100),
        }
    );

    let john = template
        .query_one(
            "example/selectEmployeeById.sql",
            &employee_mapper(),
            &[SqlParam::new("id", 100)],
        )
        .await?;
    assert_eq!(john.name.as_deref(), Some("John Doe"));
    assert_eq!(john.joined_date, Some(date(2022, 12, 31)));
    Ok(())
}

#[tokio::test]
async fn test_execute_returning_key_with_trailing_comment() -> Result<()> {
    let template = create_test_template().await?;

    let outcome = template
        .execute_returning_key(
            "example/insertEmployeeWithComment.sql",
            "id",
            &[
                SqlParam::new("name", "Dana"),
                SqlParam::new("joined_date", date(2023, 3, 1)),
            ],
        )
        .await?;
    assert_eq!(
        outcome,
        UpdateOutcome {
            affected_rows: 1,
            generated_key: Some(100),
        }
    );

    let dana = template
        .query_one(
            "example/selectEmployeeById.sql",
            &employee_mapper(),
            &[SqlParam::new("id", 100)],
        )
        .await?;
    assert_eq!(dana.name.as_deref(), Some("Dana"));
    Ok(())
}

#[tokio::test]
async fn test_execute_returning_key_counts_keys() -> Result<()> {
    let template = create_test_template().await?;

    let none = template
        .execute_returning_key(
            "example/copyEmployees.sql",
            "id",
            &[SqlParam::list("ids", [404])],
        )
        .await?;
    assert_eq!(none, UpdateOutcome { affected_rows: 0, generated_key: None });

    let err = template
        .execute_returning_key("example/copyEmployees.sql", "id", &[SqlParam::list("ids", [1, 2])])
        .await
        .unwrap_err();
    assert!(matches!(err, TwoWayError::MultipleGeneratedKeys { count: 2, .. }));
    Ok(())
}

#[tokio::test]
async fn test_template_failures_are_wrapped_with_path() -> Result<()> {
    let template = create_test_template().await?;
    let mapper = employee_mapper();

    let err = template
        .query_one("example/selectEmployeeById.sql", &mapper, &[SqlParam::new("other", 1)])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnresolvedParameter);
    assert!(err.is_template_failure());
    match &err {
        TwoWayError::TemplateOperation(op) => assert_eq!(op.path, "example/selectEmployeeById.sql"),
        other => panic!("unexpected error {other:?}"),
    }

    let err = template
        .execute(
            "example/deleteEmployeesByIds.sql",
            &[SqlParam::list("ids", [1]), SqlParam::list("ids", [2])],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParameter);

    let err = template
        .query_many("example/brokenCondition.sql", &mapper, &[SqlParam::new("name", "Bob")])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TemplateSyntaxError);

    let err = template
        .execute("../outside.sql", &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidResourcePath);
    Ok(())
}

#[tokio::test]
async fn test_database_errors_pass_through() -> Result<()> {
    let template = create_test_template().await?;

    let err = template
        .execute("example/selectFromMissingTable.sql", &[SqlParam::new("id", 1)])
        .await
        .unwrap_err();
    assert!(err.is_database_failure());
    assert!(matches!(err, TwoWayError::Database(sqlx::Error::Database(_))));
    Ok(())
}

#[tokio::test]
async fn test_mapping_errors() -> Result<()> {
    let template = create_test_template().await?;
    let salaries = RowMapper::<f64>::scalar("salary")?;

    let err = template
        .query_many("example/selectEmployees.sql", &salaries, &[SqlParam::null::<String>("name")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TwoWayError::Mapping(MappingError::MissingColumn { ref column, .. }) if column == "salary"
    ));

    // Chris has no joined date
    let strict = RowMapper::<NaiveDate>::scalar("joined_date")?;
    let err = template
        .query_one("example/selectEmployeeById.sql", &strict, &[SqlParam::new("id", 3)])
        .await
        .unwrap_err();
    assert!(matches!(err, TwoWayError::Mapping(MappingError::UnexpectedNull { .. })));
    Ok(())
}

#[tokio::test]
async fn test_clones_run_concurrently() -> Result<()> {
    let template = create_test_template().await?;

    let handles: Vec<_> = (1..=3)
        .cycle()
        .take(12)
        .map(|id| {
            let template = template.clone();
            tokio::spawn(async move {
                template
                    .query_one(
                        "example/selectEmployeeById.sql",
                        &employee_mapper(),
                        &[SqlParam::new("id", id)],
                    )
                    .await
                    .map(|e| (id, e.id))
            })
        })
        .collect();

    for handle in handles {
        let (requested, found) = handle.await??;
        assert_eq!(requested, found);
    }
    Ok(())
}

/// Tracer capturing every trace it receives
#[derive(Clone, Default)]
struct RecordingTracer {
    enabled: bool,
    traces: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl SqlTracer for RecordingTracer {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn trace(&self, trace: &SqlTrace<'_>) {
        self.traces.lock().unwrap().push((
            trace.operation.to_owned(),
            trace.path.to_owned(),
            trace.sql.to_owned(),
        ));
    }
}

#[tokio::test]
async fn test_tracer_sees_formatted_sql_once_per_success() -> Result<()> {
    let backend = common::create_seeded_backend().await?;
    let tracer = RecordingTracer {
        enabled: true,
        ..RecordingTracer::default()
    };
    let template = TwoWayTemplate::builder(backend, Dialect::Sqlite)
        .resource_loader(FsResourceLoader::new([common::sql_root()]))
        .tracer(tracer.clone())
        .build();

    template
        .query_one(
            "example/selectEmployeeById.sql",
            &employee_mapper(),
            &[SqlParam::new("id", 2)],
        )
        .await?;
    template
        .execute("example/missing.sql", &[])
        .await
        .unwrap_err();

    let traces = tracer.traces.lock().unwrap().clone();
    assert_eq!(traces.len(), 1);
    let (operation, path, sql) = &traces[0];
    assert_eq!(operation, "query_one");
    assert_eq!(path, "example/selectEmployeeById.sql");
    assert!(sql.trim_end().ends_with("WHERE id = 2"), "{sql}");
    Ok(())
}

#[tokio::test]
async fn test_disabled_tracer_sees_nothing() -> Result<()> {
    let backend = common::create_seeded_backend().await?;
    let tracer = RecordingTracer::default();
    let template = TwoWayTemplate::builder(backend, Dialect::Sqlite)
        .resource_loader(FsResourceLoader::new([common::sql_root()]))
        .tracer(tracer.clone())
        .build();

    template
        .execute(
            "example/deleteEmployeesByIds.sql",
            &[SqlParam::list("ids", [3])],
        )
        .await?;
    assert!(tracer.traces.lock().unwrap().is_empty());
    Ok(())
}

/// Backend counting calls, never touching a database
#[derive(Default)]
struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SqlBackend for CountingBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn fetch_rows(
        &self,
        _stmt: &BoundStatement,
        _limit: Option<usize>,
    ) -> Result<Vec<ResultRow>, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn execute(&self, _stmt: &BoundStatement) -> Result<u64, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn execute_returning_key(
        &self,
        _stmt: &BoundStatement,
        _key_column: &str,
    ) -> Result<GeneratedKeys, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedKeys {
            affected_rows: 0,
            keys: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_missing_resource_never_reaches_backend() {
    let backend = CountingBackend::default();
    let calls = Arc::clone(&backend.calls);
    let template = TwoWayTemplate::builder(backend, Dialect::Sqlite)
        .resource_loader(
            EmbeddedResourceLoader::new().with("example/known.sql", "SELECT 1 WHERE 1 = /*x*/1"),
        )
        .build();

    let err = template
        .execute_returning_key("example/missing.sql", "id", &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let affected = template
        .execute("example/known.sql", &[SqlParam::new("x", 1)])
        .await
        .unwrap();
    assert_eq!(affected, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
