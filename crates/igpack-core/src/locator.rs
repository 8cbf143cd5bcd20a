use crate::content::{ContentError, ContentLoader};
use crate::extractor::{self, ResourceKind, ResourceRef};
use crate::index::PackageIndex;
use igpack_cache::Package;
use igpack_schema::{compare_versions, ArtifactId, FhirRelease};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no package provides {0}")]
    NotFound(ArtifactId),
    #[error("failed to decode content for {artifact}: {source}")]
    Content {
        artifact: ArtifactId,
        #[source]
        source: ContentError,
    },
}

/// Structured model descriptor parsed from a model-definition resource.
///
/// Unknown fields are tolerated; only the identifying and linkage fields are
/// surfaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Pick the resource a package offers for `artifact`, or `None` to move on
/// to the next candidate package.
///
/// With an explicit version only an exact match counts. Without one, the
/// package's unversioned ("current") resource wins, falling back to the
/// highest available version.
fn select_resource(
    package: &Package,
    kind: ResourceKind,
    artifact: &ArtifactId,
) -> Option<ResourceRef> {
    let candidates: Vec<ResourceRef> = extractor::scan(package, kind)
        .into_iter()
        .filter(|r| extractor::matches(artifact, package, r))
        .collect();

    match &artifact.version {
        Some(version) => candidates
            .into_iter()
            .find(|r| r.version.as_deref() == Some(version.as_str())),
        None => {
            if let Some(current) = candidates.iter().find(|r| r.version.is_none()) {
                return Some(current.clone());
            }
            candidates.into_iter().max_by(|a, b| {
                compare_versions(
                    a.version.as_deref().unwrap_or(""),
                    b.version.as_deref().unwrap_or(""),
                )
            })
        }
    }
}

/// Shared lookup protocol: walk the index in resolution order, first package
/// yielding a resolvable resource short-circuits the search.
fn locate_resource<'a>(
    index: &'a PackageIndex,
    kind: ResourceKind,
    artifact: &ArtifactId,
) -> Result<(&'a Package, ResourceRef), LocateError> {
    for package in index.packages() {
        if let Some(resource) = select_resource(package, kind, artifact) {
            debug!(
                "matched {artifact} in {}#{} at {}",
                package.name(),
                package.version(),
                resource.path
            );
            return Ok((package.as_ref(), resource));
        }
    }
    Err(LocateError::NotFound(artifact.clone()))
}

fn resource_bytes<'a>(
    package: &'a Package,
    resource: &ResourceRef,
    artifact: &ArtifactId,
) -> Result<&'a [u8], LocateError> {
    extractor::read(package, resource).ok_or_else(|| LocateError::NotFound(artifact.clone()))
}

/// Resolves library identifiers to raw source bytes through the content
/// loader's version-band attachment selection.
pub struct LibrarySourceLocator<'a> {
    index: &'a PackageIndex,
    loader: ContentLoader,
}

impl<'a> LibrarySourceLocator<'a> {
    pub fn new(index: &'a PackageIndex, release: FhirRelease) -> Self {
        Self {
            index,
            loader: ContentLoader::new(release),
        }
    }

    /// Locate and decode a library's source.
    ///
    /// Once a package yields a structural match, a decode failure is
    /// surfaced as-is — the search does not continue past it.
    pub fn locate(&self, artifact: &ArtifactId) -> Result<Vec<u8>, LocateError> {
        let (package, resource) = locate_resource(self.index, ResourceKind::Library, artifact)?;
        let bytes = resource_bytes(package, &resource, artifact)?;
        self.loader.load(bytes).map_err(|source| LocateError::Content {
            artifact: artifact.clone(),
            source,
        })
    }
}

/// Resolves model identifiers to structured descriptors. Resource bytes are
/// parsed directly; no version-dependent branching.
pub struct ModelInfoLocator<'a> {
    index: &'a PackageIndex,
}

impl<'a> ModelInfoLocator<'a> {
    pub fn new(index: &'a PackageIndex) -> Self {
        Self { index }
    }

    pub fn locate(&self, artifact: &ArtifactId) -> Result<ModelDescriptor, LocateError> {
        let (package, resource) = locate_resource(self.index, ResourceKind::ModelInfo, artifact)?;
        let bytes = resource_bytes(package, &resource, artifact)?;
        serde_json::from_slice(bytes).map_err(|e| LocateError::Content {
            artifact: artifact.clone(),
            source: ContentError::Json(e),
        })
    }
}
