// ABOUTME: Database configuration types for SQLite and PostgreSQL connections
// ABOUTME: Parses connection URLs and pool sizing from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{database, env_keys};
use crate::errors::ConfigError;

/// Type-safe database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// `PostgreSQL` connection
    PostgreSQL {
        /// `PostgreSQL` connection string
        connection_string: String,
    },
    /// In-memory `SQLite`
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedDatabase` for empty input or a
    /// scheme other than `sqlite:`, `postgres://` or `postgresql://`
    pub fn parse_url(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" || path_str.is_empty() {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Ok(Self::PostgreSQL {
                connection_string: s.to_owned(),
            })
        } else if s.is_empty() || s.contains("://") {
            Err(ConfigError::UnsupportedDatabase(s.to_owned()))
        } else {
            // Bare path: SQLite file
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::PostgreSQL { connection_string } => connection_string.clone(),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Check if this is a `SQLite` database
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite { .. } | Self::Memory)
    }

    /// Check if this is a `PostgreSQL` database
    #[must_use]
    pub const fn is_postgresql(&self) -> bool {
        matches!(self, Self::PostgreSQL { .. })
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::Memory
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Connection pool sizing, applied to both backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections kept open
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: database::MAX_CONNECTIONS,
            min_connections: database::MIN_CONNECTIONS,
            acquire_timeout_secs: database::ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    /// Load pool sizing from environment (or defaults)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not a number, or if the
    /// minimum exceeds the maximum
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_connections: env_parse(env_keys::MAX_CONNECTIONS, database::MAX_CONNECTIONS)?,
            min_connections: env_parse(env_keys::MIN_CONNECTIONS, database::MIN_CONNECTIONS)?,
            acquire_timeout_secs: env_parse(
                env_keys::ACQUIRE_TIMEOUT_SECS,
                database::ACQUIRE_TIMEOUT_SECS,
            )?,
        };
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: env_keys::MAX_CONNECTIONS,
                value: "0".to_owned(),
                reason: "pool needs at least one connection".to_owned(),
            });
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::InvalidValue {
                key: env_keys::MIN_CONNECTIONS,
                value: config.min_connections.to_string(),
                reason: format!("exceeds maximum of {}", config.max_connections),
            });
        }
        Ok(config)
    }

    /// Acquire timeout as a [`Duration`]
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Parse an optional numeric environment variable
pub(crate) fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
