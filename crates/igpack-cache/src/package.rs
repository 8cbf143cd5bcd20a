use crate::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declared dependency of a package: exact name + version pin, in the
/// order the package manifest declares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageDependency {
    pub name: String,
    pub version: String,
}

/// The `package/package.json` manifest inside a package container.
///
/// `dependencies` is a JSON object; key order is preserved on parse
/// (serde_json `preserve_order`) because declaration order drives the
/// resolver's traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PackageManifestFile {
    name: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(default)]
    dependencies: serde_json::Map<String, serde_json::Value>,
}

/// A read-only handle to a resolved package: identity, declared dependencies,
/// and content entries keyed by container-relative path
/// (e.g. `package/Library-example.json`).
///
/// Packages are owned by the cache that produced them and never mutated after
/// construction; the resolver and locators only read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    version: String,
    canonical: Option<String>,
    dependencies: Vec<PackageDependency>,
    entries: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// An empty package with no dependencies or content. Building block for
    /// tests and fake cache managers.
    pub fn empty(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            canonical: None,
            dependencies: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical = Some(canonical.into());
        self
    }

    /// Append a declared dependency, preserving declaration order.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies.push(PackageDependency {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    #[must_use]
    pub fn with_entry(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), bytes.into());
        self
    }

    /// Build a package from raw container entries. Expects a
    /// `package/package.json` manifest among the entries.
    pub fn from_entries(
        id: &str,
        version: &str,
        entries: BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, CacheError> {
        let manifest_bytes =
            entries
                .get("package/package.json")
                .ok_or_else(|| CacheError::MalformedPackage {
                    id: id.to_owned(),
                    version: version.to_owned(),
                    reason: "missing package/package.json".to_owned(),
                })?;
        let manifest: PackageManifestFile = serde_json::from_slice(manifest_bytes)?;

        let mut dependencies = Vec::with_capacity(manifest.dependencies.len());
        for (name, value) in &manifest.dependencies {
            let dep_version = value
                .as_str()
                .ok_or_else(|| CacheError::MalformedPackage {
                    id: id.to_owned(),
                    version: version.to_owned(),
                    reason: format!("dependency '{name}' version is not a string"),
                })?;
            dependencies.push(PackageDependency {
                name: name.clone(),
                version: dep_version.to_owned(),
            });
        }

        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            canonical: manifest.canonical,
            dependencies,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The canonical base URL this package publishes its resources under.
    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// Declared dependencies in declaration order.
    pub fn dependencies(&self) -> &[PackageDependency] {
        &self.dependencies
    }

    pub fn entry(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Iterate entries whose path starts with `prefix`, in path order.
    pub fn entries_under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        self.entries
            .iter()
            .filter(move |(path, _)| path.starts_with(prefix))
            .map(|(path, bytes)| (path.as_str(), bytes.as_slice()))
    }
}
