// ABOUTME: SQL resource loaders resolving logical paths to template text
// ABOUTME: File-system search path, embedded registrations and an optional caching decorator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Resource Loading
//!
//! SQL templates are addressed by logical, `/`-separated relative paths such
//! as `example/selectEmployeeById.sql`. A [`ResourceLoader`] resolves the path
//! and returns the UTF-8 text. Path validation happens before any I/O.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::ResourceError;

/// Resolves a logical resource path to SQL text
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at `path`
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for malformed paths, `NotFound` when no location
    /// holds the resource and `Read` for I/O or UTF-8 failures
    async fn load(&self, path: &str) -> Result<String, ResourceError>;
}

/// Reject empty, absolute, backslashed or parent-escaping paths
///
/// # Errors
///
/// Returns `ResourceError::InvalidPath` describing the first violation
pub fn validate_resource_path(path: &str) -> Result<(), ResourceError> {
    let invalid = |reason| ResourceError::InvalidPath {
        path: path.to_owned(),
        reason,
    };
    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') || Path::new(path).is_absolute() {
        return Err(invalid("path must be relative"));
    }
    if path.contains('\\') {
        return Err(invalid("path must use '/' separators"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("path contains an empty segment")),
            "." | ".." => return Err(invalid("path must not contain '.' or '..' segments")),
            _ => {}
        }
    }
    Ok(())
}

/// Loads resources from an ordered list of directories
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    roots: Vec<PathBuf>,
}

impl FsResourceLoader {
    /// Search `roots` in order; the first root holding the file wins
    #[must_use]
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured roots in search order
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

#[async_trait]
impl ResourceLoader for FsResourceLoader {
    async fn load(&self, path: &str) -> Result<String, ResourceError> {
        validate_resource_path(path)?;

        for root in &self.roots {
            let candidate = path.split('/').fold(root.clone(), |acc, seg| acc.join(seg));
            match tokio::fs::read(&candidate).await {
                Ok(bytes) => {
                    debug!(path, location = %candidate.display(), "Loaded SQL resource");
                    return String::from_utf8(bytes).map_err(|e| ResourceError::Read {
                        path: path.to_owned(),
                        source: io::Error::new(io::ErrorKind::InvalidData, e),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ResourceError::Read {
                        path: path.to_owned(),
                        source,
                    })
                }
            }
        }

        Err(ResourceError::NotFound {
            path: path.to_owned(),
            searched: self.roots.len(),
        })
    }
}

/// Resources compiled into the binary, typically through `include_str!`
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResourceLoader {
    resources: HashMap<String, &'static str>,
}

impl EmbeddedResourceLoader {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sql` under the logical `path`
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, sql: &'static str) -> Self {
        self.resources.insert(path.into(), sql);
        self
    }

    /// Number of registered resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceLoader for EmbeddedResourceLoader {
    async fn load(&self, path: &str) -> Result<String, ResourceError> {
        validate_resource_path(path)?;
        self.resources
            .get(path)
            .map(|sql| (*sql).to_owned())
            .ok_or_else(|| ResourceError::NotFound {
                path: path.to_owned(),
                searched: 1,
            })
    }
}

/// Caches successfully loaded resources of an inner loader
///
/// Failures are never cached, so a resource that appears later is picked up.
#[derive(Debug)]
pub struct CachingResourceLoader<L> {
    inner: L,
    cache: DashMap<String, Arc<str>>,
}

impl<L: ResourceLoader> CachingResourceLoader<L> {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of cached resources
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached resource
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl<L: ResourceLoader> ResourceLoader for CachingResourceLoader<L> {
    async fn load(&self, path: &str) -> Result<String, ResourceError> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(str::to_owned(hit.value()));
        }
        let sql = self.inner.load(path).await?;
        self.cache.insert(path.to_owned(), Arc::from(sql.as_str()));
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_resource_path() {
        assert!(validate_resource_path("example/selectEmployeeById.sql").is_ok());
        for bad in ["", "  ", "/abs.sql", "a/../b.sql", "./a.sql", "a//b.sql", "a\\b.sql"] {
            assert!(
                matches!(validate_resource_path(bad), Err(ResourceError::InvalidPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_embedded_loader() {
        let loader = EmbeddedResourceLoader::new().with("a/b.sql", "SELECT 1");
        assert_eq!(loader.load("a/b.sql").await.unwrap(), "SELECT 1");
        assert!(matches!(
            loader.load("a/c.sql").await,
            Err(ResourceError::NotFound { .. })
        ));
        assert!(matches!(
            loader.load("../a/b.sql").await,
            Err(ResourceError::InvalidPath { .. })
        ));
    }
}
