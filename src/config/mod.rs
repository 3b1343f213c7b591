// ABOUTME: Configuration management for the template executor, loaded from the environment
// ABOUTME: Database URL, dialect, resource roots, caching and pool sizing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Configuration
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DATABASE_URL` | `sqlite::memory:` | database to connect to |
//! | `TWOWAY_SQL_DIALECT` | from the URL | `sqlite` or `postgres` |
//! | `TWOWAY_SQL_ROOTS` | `sql` | platform path list of resource roots |
//! | `TWOWAY_SQL_CACHE` | `false` | cache loaded resources |
//! | `DB_MAX_CONNECTIONS` | `10` | pool maximum |
//! | `DB_MIN_CONNECTIONS` | `0` | pool minimum |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | `30` | pool acquire timeout |

/// Database URL and pool configuration
pub mod database;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{defaults, env_keys};
use crate::database_plugins::Backend;
use crate::dialect::Dialect;
use crate::errors::{ConfigError, TwoWayResult};
use crate::executor::TwoWayTemplate;
use crate::resources::{CachingResourceLoader, FsResourceLoader};

use database::{env_parse, DatabaseUrl, PoolConfig};

/// Everything needed to build a ready [`TwoWayTemplate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Database to connect to
    pub database_url: DatabaseUrl,
    /// Dialect templates are rendered in
    pub dialect: Dialect,
    /// Resource roots in search order
    pub sql_roots: Vec<PathBuf>,
    /// Cache loaded resources
    pub cache_resources: bool,
    /// Pool sizing
    pub pool: PoolConfig,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            database_url: DatabaseUrl::Memory,
            dialect: Dialect::Sqlite,
            sql_roots: vec![PathBuf::from(defaults::SQL_ROOT)],
            cache_resources: false,
            pool: PoolConfig::default(),
        }
    }
}

impl TemplateConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds an unusable value
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = DatabaseUrl::parse_url(
            &env::var(env_keys::DATABASE_URL).unwrap_or_else(|_| defaults::DATABASE_URL.to_owned()),
        )?;

        let dialect = match env::var(env_keys::DIALECT) {
            Ok(raw) => raw.parse::<Dialect>().map_err(|reason| ConfigError::InvalidValue {
                key: env_keys::DIALECT,
                value: raw.clone(),
                reason,
            })?,
            Err(_) => Dialect::for_url(&database_url),
        };

        let sql_roots = match env::var_os(env_keys::ROOTS) {
            Some(raw) if !raw.is_empty() => env::split_paths(&raw).collect(),
            _ => vec![PathBuf::from(defaults::SQL_ROOT)],
        };

        Ok(Self {
            database_url,
            dialect,
            sql_roots,
            cache_resources: env_parse(env_keys::CACHE, false)?,
            pool: PoolConfig::from_env()?,
        })
    }

    /// Connect to the database and assemble the executor
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not compiled in or the connection fails
    pub async fn connect(&self) -> TwoWayResult<TwoWayTemplate> {
        let backend = Backend::connect(&self.database_url, &self.pool).await?;
        let loader = FsResourceLoader::new(self.sql_roots.iter().cloned());
        info!(
            backend = backend.backend_info(),
            dialect = %self.dialect,
            roots = ?self.sql_roots,
            cache = self.cache_resources,
            "Two-way SQL executor ready"
        );

        let builder = TwoWayTemplate::builder(backend, self.dialect);
        let template = if self.cache_resources {
            builder.resource_loader(CachingResourceLoader::new(loader)).build()
        } else {
            builder.resource_loader(loader).build()
        };
        Ok(template)
    }
}
