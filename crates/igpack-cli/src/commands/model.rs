use super::{json_pretty, EXIT_SUCCESS};
use igpack_cache::PackageCache;
use igpack_core::{ModelInfoLocator, PackageIndex, PackageManager};
use igpack_schema::{parse_manifest_file, ArtifactId};
use std::path::Path;
use std::sync::Arc;

pub fn run(
    cache: &Arc<dyn PackageCache>,
    manifest_path: &Path,
    system: &str,
    id: &str,
    artifact_version: Option<&str>,
) -> Result<u8, String> {
    let manifest = parse_manifest_file(manifest_path).map_err(|e| e.to_string())?;

    let manager = PackageManager::with_tracing(Arc::clone(cache));
    let result = manager.resolve(&manifest).map_err(|e| e.to_string())?;
    let index = PackageIndex::new(result);

    let mut artifact = ArtifactId::new(system, id);
    if let Some(version) = artifact_version {
        artifact = artifact.with_version(version);
    }

    let locator = ModelInfoLocator::new(&index);
    let descriptor = locator.locate(&artifact).map_err(|e| e.to_string())?;
    println!("{}", json_pretty(&descriptor)?);
    Ok(EXIT_SUCCESS)
}
