// ABOUTME: Result types produced by statement execution
// ABOUTME: Backend-neutral materialized rows and the update outcome with a generated key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Result Types
//!
//! - [`ResultRow`]: one materialized row, decoded from whichever backend ran
//!   the statement. Rows of one result set share their column list.
//! - [`UpdateOutcome`]: affected-row count plus the generated key of an insert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::params::SqlValue;

/// Backend-neutral materialized row
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Arc<[String]>,
    values: Vec<Option<SqlValue>>,
}

impl ResultRow {
    /// Build a row; `values` must line up with `columns`
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<Option<SqlValue>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in result order
    #[must_use]
    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    /// Values in result order, `None` for SQL NULL
    #[must_use]
    pub fn values(&self) -> &[Option<SqlValue>] {
        &self.values
    }

    /// Value at `index`; `None` for SQL NULL or out of range
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Value of the first column named `column` (case-insensitive)
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.value(i))
    }
}

/// Outcome of an insert, update or delete that reports its generated key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Number of rows the statement modified
    pub affected_rows: u64,
    /// Database-assigned key, if the statement generated one
    pub generated_key: Option<i64>,
}
