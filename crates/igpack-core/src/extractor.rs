use igpack_cache::Package;
use igpack_schema::ArtifactId;
use serde::Deserialize;

/// The kinds of typed resources the locators pull out of packages.
///
/// Both live in `Library` resources; a model descriptor is a library typed
/// `model-definition`, everything else counts as a plain library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Library,
    ModelInfo,
}

/// Header of a JSON resource inside a package's `package/` folder: just the
/// identifying fields needed for matching, plus the entry path to read the
/// full bytes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub path: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceHeader {
    resource_type: Option<String>,
    name: Option<String>,
    url: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    type_concept: Option<serde_json::Value>,
}

/// First coding code of a CodeableConcept-shaped value, if any.
fn type_code(concept: Option<&serde_json::Value>) -> Option<&str> {
    concept?
        .get("coding")?
        .get(0)?
        .get("code")?
        .as_str()
}

/// Scan a package's `package/` folder for resources of the requested kind.
///
/// Non-JSON entries, unparseable files, and foreign resource types are
/// skipped silently — packages routinely carry example resources and build
/// artifacts the locators have no interest in.
pub fn scan(package: &Package, kind: ResourceKind) -> Vec<ResourceRef> {
    let mut resources = Vec::new();
    for (path, bytes) in package.entries_under("package/") {
        if !path.ends_with(".json") || path == "package/package.json" {
            continue;
        }
        let Ok(header) = serde_json::from_slice::<ResourceHeader>(bytes) else {
            continue;
        };
        if header.resource_type.as_deref() != Some("Library") {
            continue;
        }
        let is_model = type_code(header.type_concept.as_ref()) == Some("model-definition");
        let header_kind = if is_model {
            ResourceKind::ModelInfo
        } else {
            ResourceKind::Library
        };
        if header_kind != kind {
            continue;
        }
        resources.push(ResourceRef {
            path: path.to_owned(),
            name: header.name,
            url: header.url,
            version: header.version,
        });
    }
    resources
}

/// Whether a resource in `package` matches the requested identifier's
/// namespace and id (version matching happens separately).
///
/// A match is either an exact canonical URL
/// (`{system}/Library/{id}`) or, for resources without a URL of their own, a
/// name match inside the package that publishes under the identifier's
/// system.
pub fn matches(artifact: &ArtifactId, package: &Package, resource: &ResourceRef) -> bool {
    if resource.url.as_deref() == Some(artifact.canonical("Library").as_str()) {
        return true;
    }
    package.canonical() == Some(artifact.system.as_str())
        && resource.name.as_deref() == Some(artifact.id.as_str())
}

/// Raw bytes of a previously scanned resource.
pub fn read<'a>(package: &'a Package, resource: &ResourceRef) -> Option<&'a [u8]> {
    package.entry(&resource.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_json(name: &str, url: &str, version: Option<&str>) -> String {
        let version_field = version
            .map(|v| format!(r#""version": "{v}","#))
            .unwrap_or_default();
        format!(
            r#"{{ "resourceType": "Library", "name": "{name}", "url": "{url}", {version_field} "status": "active" }}"#
        )
    }

    fn model_json(name: &str, url: &str) -> String {
        format!(
            r#"{{
  "resourceType": "Library",
  "name": "{name}",
  "url": "{url}",
  "type": {{ "coding": [ {{ "code": "model-definition" }} ] }}
}}"#
        )
    }

    fn sample_package() -> Package {
        Package::empty("my.ig", "0.1.0")
            .with_canonical("http://example.org/fhir/uv/myig")
            .with_entry(
                "package/Library-example.json",
                library_json(
                    "example",
                    "http://example.org/fhir/uv/myig/Library/example",
                    Some("0.2.0"),
                ),
            )
            .with_entry(
                "package/Library-QICore.json",
                model_json("QICore", "http://example.org/fhir/uv/myig/Library/QICore"),
            )
            .with_entry("package/Patient-example.json", r#"{ "resourceType": "Patient" }"#)
            .with_entry("package/readme.txt", "not json")
    }

    #[test]
    fn scan_separates_libraries_from_models() {
        let pkg = sample_package();
        let libraries = scan(&pkg, ResourceKind::Library);
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name.as_deref(), Some("example"));
        assert_eq!(libraries[0].version.as_deref(), Some("0.2.0"));

        let models = scan(&pkg, ResourceKind::ModelInfo);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name.as_deref(), Some("QICore"));
    }

    #[test]
    fn scan_skips_foreign_and_non_json_entries() {
        let pkg = sample_package();
        let all: Vec<_> = scan(&pkg, ResourceKind::Library)
            .into_iter()
            .chain(scan(&pkg, ResourceKind::ModelInfo))
            .collect();
        assert!(all.iter().all(|r| r.path.contains("Library")));
    }

    #[test]
    fn matches_by_canonical_url() {
        let pkg = sample_package();
        let resource = &scan(&pkg, ResourceKind::Library)[0];
        let artifact = ArtifactId::new("http://example.org/fhir/uv/myig", "example");
        assert!(matches(&artifact, &pkg, resource));
    }

    #[test]
    fn matches_by_name_under_package_canonical() {
        let pkg = Package::empty("my.ig", "0.1.0")
            .with_canonical("http://example.org/fhir/uv/myig")
            .with_entry(
                "package/Library-local.json",
                r#"{ "resourceType": "Library", "name": "local" }"#,
            );
        let resource = &scan(&pkg, ResourceKind::Library)[0];
        let artifact = ArtifactId::new("http://example.org/fhir/uv/myig", "local");
        assert!(matches(&artifact, &pkg, resource));
    }

    #[test]
    fn rejects_mismatched_system() {
        let pkg = sample_package();
        let resource = &scan(&pkg, ResourceKind::Library)[0];
        let artifact = ArtifactId::new("http://somewhere-else.org/ig", "example");
        assert!(!matches(&artifact, &pkg, resource));
    }

    #[test]
    fn read_returns_resource_bytes() {
        let pkg = sample_package();
        let resource = &scan(&pkg, ResourceKind::Library)[0];
        let bytes = read(&pkg, resource).unwrap();
        assert!(std::str::from_utf8(bytes).unwrap().contains("example"));
    }
}
