// ABOUTME: Integration test for installing the global tracing subscriber
// ABOUTME: Runs in its own process so the pretty formatter can be installed exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use twoway_sql::logging::{LogFormat, LoggingConfig};

#[test]
fn test_pretty_subscriber_installs_once() {
    let config = LoggingConfig {
        level: "twoway_sql=debug".into(),
        format: LogFormat::Pretty,
        include_location: true,
        include_thread: true,
    };

    config.init().unwrap();
    tracing::debug!(target: "twoway_sql::sql", sql = "SELECT 1", "Executed SQL");

    // A global subscriber is already in place
    assert!(config.init().is_err());
}
