//! Dependency resolution and artifact lookup engine for igpack.
//!
//! This crate walks an implementation guide's declared dependency edges
//! through the package cache port into a deterministic ordered package list
//! (`PackageManager::resolve`), wraps that list in a read-only
//! `PackageIndex`, and serves typed artifact lookups against it: CQL library
//! sources (`LibrarySourceLocator`) and model descriptors
//! (`ModelInfoLocator`), materialized through the artifact extractor and the
//! version-band-aware `ContentLoader`.

pub mod content;
pub mod extractor;
pub mod index;
pub mod locator;
pub mod resolver;
pub mod sink;

pub use content::{ContentError, ContentLoader};
pub use extractor::{ResourceKind, ResourceRef};
pub use index::PackageIndex;
pub use locator::{LibrarySourceLocator, LocateError, ModelDescriptor, ModelInfoLocator};
pub use resolver::{PackageManager, ResolutionResult, ResolveError};
pub use sink::{LogSink, TracingSink};
