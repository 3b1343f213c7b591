// ABOUTME: Shared database logic for PostgreSQL and SQLite backends
// ABOUTME: Generic argument binding and result-row helpers used by both plugins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Typed argument binding (typed NULLs included)
pub mod binding;

/// Column lists, `RETURNING` rewriting and key extraction
pub mod rows;
