use crate::sink::LogSink;
use igpack_cache::{CacheError, Package, PackageCache};
use igpack_schema::{IgManifest, ManifestError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("failed to load dependency {id}#{version}: {source}")]
    DependencyLoad {
        id: String,
        version: String,
        #[source]
        source: CacheError,
    },
}

/// Ordered, deduplicated outcome of a dependency resolution.
///
/// Insertion order is significant: it defines lookup priority for every
/// artifact search that follows. The first entry is always the core
/// specification package for the manifest's FHIR version.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    packages: Vec<Arc<Package>>,
}

impl ResolutionResult {
    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Package names in resolution order.
    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name()).collect()
    }

    /// `(name, version)` pairs in resolution order, for inspection output.
    pub fn summaries(&self) -> Vec<(String, String)> {
        self.packages
            .iter()
            .map(|p| (p.name().to_owned(), p.version().to_owned()))
            .collect()
    }

    pub(crate) fn into_packages(self) -> Vec<Arc<Package>> {
        self.packages
    }
}

/// Resolves an implementation guide's transitive dependency graph into a
/// `ResolutionResult`, consulting the package cache port for every package.
pub struct PackageManager {
    cache: Arc<dyn PackageCache>,
    log: Arc<dyn LogSink>,
}

impl PackageManager {
    pub fn new(cache: Arc<dyn PackageCache>, log: Arc<dyn LogSink>) -> Self {
        Self { cache, log }
    }

    /// Convenience constructor with the default tracing-backed sink.
    pub fn with_tracing(cache: Arc<dyn PackageCache>) -> Self {
        Self::new(cache, Arc::new(crate::sink::TracingSink))
    }

    /// Resolve the manifest's dependency graph into an ordered package list.
    ///
    /// The core specification package for the manifest's FHIR version is
    /// loaded first and seeds the result unconditionally. Declared
    /// dependencies are then walked pre-order: each package is appended as
    /// soon as it loads, its own dependencies expanded in declaration order
    /// before the next sibling. A name already present is neither re-appended
    /// nor re-expanded, even at a different pinned version — first occurrence
    /// wins, which also breaks dependency cycles.
    ///
    /// Any dependency the cache port cannot produce aborts the whole
    /// resolution with the offending id+version.
    pub fn resolve(&self, manifest: &IgManifest) -> Result<ResolutionResult, ResolveError> {
        let release = manifest.release()?;
        let mut packages: Vec<Arc<Package>> = Vec::new();

        let core = self.load(release.core_package_id(), &manifest.fhir_version)?;
        self.log.log_message(&format!(
            "resolved core package {}#{}",
            core.name(),
            core.version()
        ));
        packages.push(core);

        for dep in &manifest.dependencies {
            self.visit(&dep.package_id, &dep.version, &mut packages)?;
        }

        Ok(ResolutionResult { packages })
    }

    fn visit(
        &self,
        id: &str,
        version: &str,
        packages: &mut Vec<Arc<Package>>,
    ) -> Result<(), ResolveError> {
        if packages.iter().any(|p| p.name() == id) {
            debug!("skipping {id}#{version}: name already resolved");
            return Ok(());
        }

        let package = self.load(id, version)?;
        self.log
            .log_message(&format!("resolved {}#{}", package.name(), package.version()));
        packages.push(Arc::clone(&package));

        for dep in package.dependencies() {
            self.visit(&dep.name, &dep.version, packages)?;
        }
        Ok(())
    }

    /// Load through the port: cache-only first, fetch-and-cache on a miss.
    fn load(&self, id: &str, version: &str) -> Result<Arc<Package>, ResolveError> {
        let cached = self
            .cache
            .load_from_cache_only(id, version)
            .map_err(|source| dependency_load(id, version, source))?;
        if let Some(package) = cached {
            return Ok(package);
        }

        let url = self
            .cache
            .package_url(id)
            .map_err(|source| dependency_load(id, version, source))?;
        self.log
            .log_message(&format!("fetching {id}#{version} from {url}"));
        self.cache
            .fetch_and_cache(id, version, &url)
            .map_err(|source| dependency_load(id, version, source))
    }
}

fn dependency_load(id: &str, version: &str, source: CacheError) -> ResolveError {
    ResolveError::DependencyLoad {
        id: id.to_owned(),
        version: version.to_owned(),
        source,
    }
}
