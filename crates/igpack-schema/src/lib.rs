//! Implementation guide manifest parsing, FHIR version bands, and artifact
//! identifiers for igpack.
//!
//! This crate defines the schema layer: the IG manifest model (`IgManifest`)
//! with its JSON descriptor parsing, the closed set of supported FHIR
//! specification version bands (`FhirRelease`) and their mapping to canonical
//! core package ids, and the artifact identifier type (`ArtifactId`) used for
//! library source and model descriptor lookups.

pub mod artifact;
pub mod manifest;
pub mod release;

pub use artifact::ArtifactId;
pub use manifest::{parse_manifest_file, parse_manifest_str, IgDependency, IgManifest, ManifestError};
pub use release::{compare_versions, FhirRelease};
