// ABOUTME: Diagnostic SQL tracing port used by the statement executor
// ABOUTME: Default tracer logs formatted SQL at DEBUG; a no-op tracer disables it entirely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use tracing::{debug, Level};

/// Log target of executed-SQL events
pub const SQL_TRACE_TARGET: &str = "twoway_sql::sql";

/// One successfully executed statement
#[derive(Debug, Clone, Serialize)]
pub struct SqlTrace<'a> {
    /// Executor operation, e.g. `query_one`
    pub operation: &'static str,
    /// Logical resource path
    pub path: &'a str,
    /// Statement with arguments inlined
    pub sql: &'a str,
}

/// Receives executed-statement diagnostics
pub trait SqlTracer: Send + Sync {
    /// Checked before a trace is built
    fn enabled(&self) -> bool;

    /// Record one executed statement
    fn trace(&self, trace: &SqlTrace<'_>);
}

/// Emits `tracing` events on [`SQL_TRACE_TARGET`] at DEBUG
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSqlTracer;

impl SqlTracer for TracingSqlTracer {
    fn enabled(&self) -> bool {
        tracing::enabled!(target: SQL_TRACE_TARGET, Level::DEBUG)
    }

    fn trace(&self, trace: &SqlTrace<'_>) {
        debug!(
            target: SQL_TRACE_TARGET,
            operation = trace.operation,
            path = trace.path,
            "Executed SQL: {}",
            trace.sql
        );
    }
}

/// Discards every trace
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSqlTracer;

impl SqlTracer for NoopSqlTracer {
    fn enabled(&self) -> bool {
        false
    }

    fn trace(&self, _trace: &SqlTrace<'_>) {}
}
