// ABOUTME: Crate-wide constants for configuration keys and defaults
// ABOUTME: Environment variable names, pool defaults and resource search defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Environment variable names and the defaults applied when they are unset.

/// Environment variable names
pub mod env_keys {
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Dialect override (`sqlite` or `postgres`)
    pub const DIALECT: &str = "TWOWAY_SQL_DIALECT";
    /// Platform path list of SQL resource roots
    pub const ROOTS: &str = "TWOWAY_SQL_ROOTS";
    /// Enable the resource cache
    pub const CACHE: &str = "TWOWAY_SQL_CACHE";
    /// Pool maximum connections
    pub const MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
    /// Pool minimum connections
    pub const MIN_CONNECTIONS: &str = "DB_MIN_CONNECTIONS";
    /// Pool acquire timeout in seconds
    pub const ACQUIRE_TIMEOUT_SECS: &str = "DB_ACQUIRE_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    /// Database used when `DATABASE_URL` is unset
    pub const DATABASE_URL: &str = "sqlite::memory:";
    /// Resource root used when `TWOWAY_SQL_ROOTS` is unset
    pub const SQL_ROOT: &str = "sql";
}

/// Connection pool defaults
pub mod database {
    /// Default maximum pool size
    pub const MAX_CONNECTIONS: u32 = 10;
    /// Default minimum pool size
    pub const MIN_CONNECTIONS: u32 = 0;
    /// Default acquire timeout in seconds
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 30;
}
