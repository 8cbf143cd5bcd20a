use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a requested artifact: a logical namespace (canonical URL of the
/// publishing guide), a logical id, and an optional exact version.
///
/// Used for both library-source and model-descriptor lookups. An identifier
/// without a version requests the package's default ("current") resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    pub system: String,
    pub id: String,
    pub version: Option<String>,
}

impl ArtifactId {
    pub fn new(system: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            id: id.into(),
            version: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The canonical URL form of this identifier within a resource type,
    /// e.g. `http://example.org/fhir/uv/myig/Library/example`.
    pub fn canonical(&self, resource_type: &str) -> String {
        format!("{}/{}/{}", self.system, resource_type, self.id)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}|{}@{}", self.system, self.id, v),
            None => write!(f, "{}|{}", self.system, self.id),
        }
    }
}
