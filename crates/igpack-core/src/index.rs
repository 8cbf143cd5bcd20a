use crate::resolver::ResolutionResult;
use igpack_cache::Package;
use std::sync::Arc;

/// Read-only view over a resolution result, searched in resolution order.
///
/// Earlier packages (shallower / earlier-declared dependencies) win when two
/// packages both claim to provide a matching artifact. The index offers no
/// mutation capability; packages behind it are immutable.
#[derive(Debug, Clone)]
pub struct PackageIndex {
    packages: Vec<Arc<Package>>,
}

impl PackageIndex {
    pub fn new(resolution: ResolutionResult) -> Self {
        Self {
            packages: resolution.into_packages(),
        }
    }

    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Lazily iterate packages satisfying `predicate`, preserving resolution
    /// order.
    pub fn find_candidates<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Arc<Package>>
    where
        P: Fn(&Package) -> bool + 'a,
    {
        self.packages.iter().filter(move |p| predicate(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PackageManager;
    use igpack_cache::MemoryCache;
    use igpack_schema::IgManifest;

    fn index_of(names: &[&str]) -> PackageIndex {
        let cache = MemoryCache::new();
        cache.put(Package::empty("hl7.fhir.r4.core", "4.0.1"));
        let mut manifest = IgManifest::new("test.ig", "4.0.1");
        for name in names {
            cache.put(Package::empty(*name, "1.0.0"));
            manifest = manifest.with_dependency(*name, "1.0.0");
        }
        let result = PackageManager::with_tracing(Arc::new(cache))
            .resolve(&manifest)
            .unwrap();
        PackageIndex::new(result)
    }

    #[test]
    fn candidates_iterate_in_resolution_order() {
        let index = index_of(&["b.pkg", "a.pkg"]);
        let names: Vec<&str> = index
            .find_candidates(|p| p.name() != "hl7.fhir.r4.core")
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["b.pkg", "a.pkg"]);
    }

    #[test]
    fn predicate_filters_lazily_without_reordering() {
        let index = index_of(&["x.pkg", "y.pkg", "z.pkg"]);
        let mut candidates = index.find_candidates(|p| p.name().starts_with('z'));
        assert_eq!(candidates.next().map(|p| p.name()), Some("z.pkg"));
        assert!(candidates.next().is_none());
    }

    #[test]
    fn empty_predicate_yields_nothing() {
        let index = index_of(&[]);
        assert_eq!(index.len(), 1); // core package only
        assert!(index.find_candidates(|_| false).next().is_none());
    }
}
