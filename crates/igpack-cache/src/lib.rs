//! Package cache port and package content model for igpack.
//!
//! This crate provides the storage side of resolution: the read-only `Package`
//! handle (manifest, declared dependencies, content entries), the
//! `PackageCache` capability trait consumed by the dependency resolver, an
//! in-memory implementation for tests and embedders, and a filesystem cache
//! (`FsPackageCache`) that unpacks `.tgz` package containers fetched from an
//! HTTP registry.

pub mod fs;
pub mod memory;
pub mod package;

pub use fs::FsPackageCache;
pub use memory::MemoryCache;
pub use package::{Package, PackageDependency};

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("package not found: {id}#{version}")]
    NotFound { id: String, version: String },
    #[error("malformed package {id}#{version}: {reason}")]
    MalformedPackage {
        id: String,
        version: String,
        reason: String,
    },
    #[error("package manifest parse error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Capability interface over a package cache/store — the port the dependency
/// resolver is handed.
///
/// Implementations own the packages they return; callers only read and
/// forward the `Arc` handles. A shared cache must provide its own locking;
/// the resolver performs no synchronization of its own.
pub trait PackageCache: Send + Sync {
    /// Load a package from the local cache only. `Ok(None)` on a cache miss.
    fn load_from_cache_only(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Option<Arc<Package>>, CacheError>;

    /// Fetch a package from its remote source and add it to the cache.
    /// `source_desc` is a human-readable description of where the package is
    /// being fetched from, used in diagnostics.
    fn fetch_and_cache(
        &self,
        id: &str,
        version: &str,
        source_desc: &str,
    ) -> Result<Arc<Package>, CacheError>;

    /// The advertised download URL for a package id.
    fn package_url(&self, id: &str) -> Result<String, CacheError>;
}
