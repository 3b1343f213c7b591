// ABOUTME: Statement executor loading SQL resources, binding parameters and running statements
// ABOUTME: Provides query_one, query_many, execute and execute_returning_key over any backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Statement Executor
//!
//! Every operation runs the same pipeline: load the SQL resource, validate
//! the parameters, render the template, then run the bound statement on the
//! backend. Failures before the backend is reached are reported as
//! [`TemplateOperationError`] with the resource path; driver failures pass
//! through as [`sqlx::Error`].
//!
//! ```rust,no_run
//! # async fn demo() -> twoway_sql::errors::TwoWayResult<()> {
//! use twoway_sql::config::database::{DatabaseUrl, PoolConfig};
//! use twoway_sql::database_plugins::Backend;
//! use twoway_sql::dialect::Dialect;
//! use twoway_sql::executor::TwoWayTemplate;
//! use twoway_sql::mapping::RowMapper;
//! use twoway_sql::params::SqlParam;
//!
//! let backend = Backend::connect(&DatabaseUrl::Memory, &PoolConfig::default()).await?;
//! let template = TwoWayTemplate::new(backend, Dialect::Sqlite);
//! let name = RowMapper::<String>::scalar("name")?;
//! let bob = template
//!     .query_one("example/selectNameById.sql", &name, &[SqlParam::new("id", 2)])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::constants::defaults;
use crate::database_plugins::{Backend, SqlBackend};
use crate::dialect::Dialect;
use crate::errors::{TemplateOperationError, TwoWayError, TwoWayResult};
use crate::mapping::RowMapper;
use crate::models::UpdateOutcome;
use crate::observability::{SqlTrace, SqlTracer, TracingSqlTracer};
use crate::params::{validate_params, SqlParam};
use crate::resources::{FsResourceLoader, ResourceLoader};
use crate::template::{BoundStatement, TemplateEngine, TwoWaySqlEngine};

/// Executes two-way SQL resources against a backend
///
/// Cloning is cheap; all collaborators are shared.
pub struct TwoWayTemplate<B = Backend> {
    backend: Arc<B>,
    dialect: Dialect,
    loader: Arc<dyn ResourceLoader>,
    engine: Arc<dyn TemplateEngine>,
    tracer: Arc<dyn SqlTracer>,
}

impl<B> Clone for TwoWayTemplate<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            dialect: self.dialect,
            loader: Arc::clone(&self.loader),
            engine: Arc::clone(&self.engine),
            tracer: Arc::clone(&self.tracer),
        }
    }
}

impl<B> fmt::Debug for TwoWayTemplate<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoWayTemplate")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl<B: SqlBackend> TwoWayTemplate<B> {
    /// Create an executor with the default collaborators
    ///
    /// Resources are read from `./sql`, templates are rendered by
    /// [`TwoWaySqlEngine`] and executed SQL is traced at DEBUG.
    #[must_use]
    pub fn new(backend: B, dialect: Dialect) -> Self {
        Self::builder(backend, dialect).build()
    }

    /// Start configuring an executor
    #[must_use]
    pub fn builder(backend: B, dialect: Dialect) -> TwoWayTemplateBuilder<B> {
        TwoWayTemplateBuilder {
            backend,
            dialect,
            loader: None,
            engine: None,
            tracer: None,
        }
    }

    /// Backend statements run on
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Dialect fixed at construction
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Load and bind a resource without executing it
    ///
    /// # Errors
    ///
    /// Returns `TwoWayError::TemplateOperation` if loading, parameter
    /// validation or rendering fails
    pub async fn bind(&self, path: &str, params: &[SqlParam]) -> TwoWayResult<BoundStatement> {
        let template = self
            .loader
            .load(path)
            .await
            .map_err(|e| TemplateOperationError::new(path, e))?;
        validate_params(params).map_err(|e| TemplateOperationError::new(path, e))?;
        let stmt = self
            .engine
            .render(&template, params)
            .map_err(|e| TemplateOperationError::new(path, e))?;
        debug!(path, arguments = stmt.arguments().len(), "Bound SQL template");
        Ok(stmt)
    }

    /// Run a query expected to return exactly one row
    ///
    /// # Errors
    ///
    /// Returns `NoResult` for zero rows, `MultipleResults` for more than one,
    /// and template, database or mapping failures as they occur
    pub async fn query_one<T>(
        &self,
        path: &str,
        mapper: &RowMapper<T>,
        params: &[SqlParam],
    ) -> TwoWayResult<T> {
        let stmt = self.bind(path, params).await?;
        let rows = self.backend.fetch_rows(&stmt, Some(2)).await?;
        self.trace("query_one", path, &stmt);

        match rows.as_slice() {
            [] => Err(TwoWayError::NoResult {
                path: path.to_owned(),
            }),
            [row] => Ok(mapper.map_row(row)?),
            _ => Err(TwoWayError::MultipleResults {
                path: path.to_owned(),
            }),
        }
    }

    /// Run a query and map every row in order
    ///
    /// # Errors
    ///
    /// Returns template, database or mapping failures
    pub async fn query_many<T>(
        &self,
        path: &str,
        mapper: &RowMapper<T>,
        params: &[SqlParam],
    ) -> TwoWayResult<Vec<T>> {
        let stmt = self.bind(path, params).await?;
        let rows = self.backend.fetch_rows(&stmt, None).await?;
        self.trace("query_many", path, &stmt);
        Ok(mapper.map_rows(&rows)?)
    }

    /// Run an insert, update or delete and return the affected-row count
    ///
    /// # Errors
    ///
    /// Returns template or database failures
    pub async fn execute(&self, path: &str, params: &[SqlParam]) -> TwoWayResult<u64> {
        let stmt = self.bind(path, params).await?;
        let affected = self.backend.execute(&stmt).await?;
        self.trace("execute", path, &stmt);
        Ok(affected)
    }

    /// Run an insert and report the generated value of `key_column`
    ///
    /// # Errors
    ///
    /// Returns `MultipleGeneratedKeys` when more than one key was generated,
    /// and template or database failures as they occur
    pub async fn execute_returning_key(
        &self,
        path: &str,
        key_column: &str,
        params: &[SqlParam],
    ) -> TwoWayResult<UpdateOutcome> {
        let stmt = self.bind(path, params).await?;
        let generated = self.backend.execute_returning_key(&stmt, key_column).await?;
        self.trace("execute_returning_key", path, &stmt);

        let generated_key = match generated.keys.as_slice() {
            [] => None,
            [key] => Some(*key),
            keys => {
                return Err(TwoWayError::MultipleGeneratedKeys {
                    path: path.to_owned(),
                    count: keys.len(),
                })
            }
        };
        Ok(UpdateOutcome {
            affected_rows: generated.affected_rows,
            generated_key,
        })
    }

    fn trace(&self, operation: &'static str, path: &str, stmt: &BoundStatement) {
        if self.tracer.enabled() {
            self.tracer.trace(&SqlTrace {
                operation,
                path,
                sql: stmt.formatted_sql(),
            });
        }
    }
}

/// Configures optional collaborators of a [`TwoWayTemplate`]
pub struct TwoWayTemplateBuilder<B> {
    backend: B,
    dialect: Dialect,
    loader: Option<Arc<dyn ResourceLoader>>,
    engine: Option<Arc<dyn TemplateEngine>>,
    tracer: Option<Arc<dyn SqlTracer>>,
}

impl<B: SqlBackend> TwoWayTemplateBuilder<B> {
    /// Replace the resource loader
    #[must_use]
    pub fn resource_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Replace the template engine
    #[must_use]
    pub fn template_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Replace the SQL tracer
    #[must_use]
    pub fn tracer(mut self, tracer: impl SqlTracer + 'static) -> Self {
        self.tracer = Some(Arc::new(tracer));
        self
    }

    /// Finish configuration
    #[must_use]
    pub fn build(self) -> TwoWayTemplate<B> {
        let dialect = self.dialect;
        TwoWayTemplate {
            backend: Arc::new(self.backend),
            dialect,
            loader: self
                .loader
                .unwrap_or_else(|| Arc::new(FsResourceLoader::new([defaults::SQL_ROOT]))),
            engine: self
                .engine
                .unwrap_or_else(|| Arc::new(TwoWaySqlEngine::new(dialect))),
            tracer: self.tracer.unwrap_or_else(|| Arc::new(TracingSqlTracer)),
        }
    }
}
