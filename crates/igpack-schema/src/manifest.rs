use crate::release::FhirRelease;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("packageId must not be empty")]
    EmptyPackageId,
    #[error("unsupported fhirVersion: '{0}' (expected a 3.0.x, 4.0.x, 4.3.x, or 5.0.x version)")]
    UnsupportedFhirVersion(String),
    #[error("dependency on '{package_id}' has no pinned version")]
    UnpinnedDependency { package_id: String },
}

/// A declared dependency of an implementation guide: an exact id + version pin.
///
/// No version ranges — each manifest pins the versions it was published against.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IgDependency {
    pub package_id: String,
    pub version: String,
}

/// Root descriptor of an implementation guide: package identity, target FHIR
/// version, and the ordered list of direct dependencies.
///
/// Declaration order of `dependencies` is significant: it drives the traversal
/// order of dependency resolution. The manifest is immutable once parsed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IgManifest {
    pub package_id: String,
    pub fhir_version: String,
    #[serde(default)]
    pub dependencies: Vec<IgDependency>,
}

impl IgManifest {
    /// Build a manifest programmatically (embedders and tests; parsing an
    /// external descriptor is the other ingestion path).
    pub fn new(package_id: impl Into<String>, fhir_version: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            fhir_version: fhir_version.into(),
            dependencies: Vec::new(),
        }
    }

    /// Append a declared dependency, preserving declaration order.
    #[must_use]
    pub fn with_dependency(
        mut self,
        package_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.dependencies.push(IgDependency {
            package_id: package_id.into(),
            version: version.into(),
        });
        self
    }

    /// The FHIR version band this manifest targets.
    pub fn release(&self) -> Result<FhirRelease, ManifestError> {
        FhirRelease::from_version(&self.fhir_version)
            .ok_or_else(|| ManifestError::UnsupportedFhirVersion(self.fhir_version.clone()))
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.package_id.is_empty() {
            return Err(ManifestError::EmptyPackageId);
        }
        self.release()?;
        for dep in &self.dependencies {
            if dep.version.is_empty() {
                return Err(ManifestError::UnpinnedDependency {
                    package_id: dep.package_id.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_manifest_str(input: &str) -> Result<IgManifest, ManifestError> {
    let manifest: IgManifest = serde_json::from_str(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<IgManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
