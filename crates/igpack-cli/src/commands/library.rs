use super::EXIT_SUCCESS;
use igpack_cache::PackageCache;
use igpack_core::{LibrarySourceLocator, PackageIndex, PackageManager};
use igpack_schema::{parse_manifest_file, ArtifactId};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    cache: &Arc<dyn PackageCache>,
    manifest_path: &Path,
    system: &str,
    id: &str,
    artifact_version: Option<&str>,
    out: Option<&Path>,
) -> Result<u8, String> {
    let manifest = parse_manifest_file(manifest_path).map_err(|e| e.to_string())?;
    let release = manifest.release().map_err(|e| e.to_string())?;

    let manager = PackageManager::with_tracing(Arc::clone(cache));
    let result = manager.resolve(&manifest).map_err(|e| e.to_string())?;
    let index = PackageIndex::new(result);

    let mut artifact = ArtifactId::new(system, id);
    if let Some(version) = artifact_version {
        artifact = artifact.with_version(version);
    }

    let locator = LibrarySourceLocator::new(&index, release);
    let source = locator.locate(&artifact).map_err(|e| e.to_string())?;

    match out {
        Some(path) => {
            std::fs::write(path, &source).map_err(|e| e.to_string())?;
            println!("wrote {} bytes to {}", source.len(), path.display());
        }
        None => {
            std::io::stdout()
                .write_all(&source)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(EXIT_SUCCESS)
}
