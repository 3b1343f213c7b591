// ABOUTME: Integration tests for SQL resource loaders
// ABOUTME: Validates search order, path validation, read failures and cache behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;
use twoway_sql::errors::ResourceError;
use twoway_sql::resources::{CachingResourceLoader, FsResourceLoader, ResourceLoader};

fn write(root: &Path, path: &str, contents: &[u8]) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, contents).unwrap();
}

#[tokio::test]
async fn test_first_root_wins() -> Result<()> {
    let first = TempDir::new()?;
    let second = TempDir::new()?;
    write(second.path(), "example/a.sql", b"SELECT 2");
    write(second.path(), "example/b.sql", b"SELECT 'b'");
    write(first.path(), "example/a.sql", b"SELECT 1");

    let loader = FsResourceLoader::new([first.path(), second.path()]);
    assert_eq!(loader.load("example/a.sql").await?, "SELECT 1");
    assert_eq!(loader.load("example/b.sql").await?, "SELECT 'b'");
    Ok(())
}

#[tokio::test]
async fn test_not_found_reports_searched_roots() -> Result<()> {
    let first = TempDir::new()?;
    let second = TempDir::new()?;
    let loader = FsResourceLoader::new([first.path(), second.path()]);

    let err = loader.load("example/missing.sql").await.unwrap_err();
    match err {
        ResourceError::NotFound { path, searched } => {
            assert_eq!(path, "example/missing.sql");
            assert_eq!(searched, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_invalid_paths_fail_before_io() {
    let loader = FsResourceLoader::new(["/definitely/not/a/root"]);
    for path in ["", "/etc/passwd", "example/../../secret.sql"] {
        assert!(
            matches!(loader.load(path).await, Err(ResourceError::InvalidPath { .. })),
            "{path:?}"
        );
    }
}

#[tokio::test]
async fn test_invalid_utf8_is_a_read_error() -> Result<()> {
    let root = TempDir::new()?;
    write(root.path(), "bad.sql", &[0xff, 0xfe, 0x00]);

    let err = FsResourceLoader::new([root.path()])
        .load("bad.sql")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Read { .. }));
    Ok(())
}

#[tokio::test]
async fn test_directory_is_a_read_error() -> Result<()> {
    let root = TempDir::new()?;
    fs::create_dir_all(root.path().join("example").join("dir.sql"))?;

    let err = FsResourceLoader::new([root.path()])
        .load("example/dir.sql")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Read { .. }), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn test_cache_keeps_hits_and_skips_failures() -> Result<()> {
    let root = TempDir::new()?;
    write(root.path(), "a.sql", b"SELECT 1");
    let loader = CachingResourceLoader::new(FsResourceLoader::new([root.path()]));

    assert_eq!(loader.load("a.sql").await?, "SELECT 1");
    write(root.path(), "a.sql", b"SELECT 2");
    assert_eq!(loader.load("a.sql").await?, "SELECT 1");

    assert!(loader.load("b.sql").await.is_err());
    write(root.path(), "b.sql", b"SELECT 'late'");
    assert_eq!(loader.load("b.sql").await?, "SELECT 'late'");
    assert_eq!(loader.cached(), 2);

    loader.clear();
    assert_eq!(loader.load("a.sql").await?, "SELECT 2");
    Ok(())
}

#[tokio::test]
async fn test_fixture_root_resolves() -> Result<()> {
    let loader = FsResourceLoader::new([common::sql_root()]);
    let sql = loader.load("example/selectEmployeeById.sql").await?;
    assert!(sql.contains("/*id*/"));
    Ok(())
}
