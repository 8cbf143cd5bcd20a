use crate::{CacheError, Package, PackageCache};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory package cache for tests and embedders that pre-seed packages.
///
/// `fetch_and_cache` draws from the same map, so a seeded package behaves the
/// same whether the resolver hits the cache-only or the fetch path.
pub struct MemoryCache {
    packages: Mutex<HashMap<(String, String), Arc<Package>>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            packages: Mutex::new(HashMap::new()),
        }
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, package: Package) {
        let key = (package.name().to_owned(), package.version().to_owned());
        // Seeded packages are immutable, so a poisoned lock is still readable.
        let mut packages = self.packages.lock().unwrap_or_else(|e| e.into_inner());
        packages.insert(key, Arc::new(package));
    }

    fn get(&self, id: &str, version: &str) -> Option<Arc<Package>> {
        let packages = self.packages.lock().unwrap_or_else(|e| e.into_inner());
        packages.get(&(id.to_owned(), version.to_owned())).cloned()
    }
}

impl PackageCache for MemoryCache {
    fn load_from_cache_only(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Option<Arc<Package>>, CacheError> {
        Ok(self.get(id, version))
    }

    fn fetch_and_cache(
        &self,
        id: &str,
        version: &str,
        _source_desc: &str,
    ) -> Result<Arc<Package>, CacheError> {
        self.get(id, version).ok_or_else(|| CacheError::NotFound {
            id: id.to_owned(),
            version: version.to_owned(),
        })
    }

    fn package_url(&self, id: &str) -> Result<String, CacheError> {
        Ok(format!("memory://{id}"))
    }
}
