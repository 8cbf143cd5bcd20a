use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use igpack_cache::PackageCache;
use igpack_core::PackageManager;
use igpack_schema::parse_manifest_file;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct ResolvedLine {
    name: String,
    version: String,
}

pub fn run(
    cache: &Arc<dyn PackageCache>,
    manifest_path: &Path,
    json: bool,
) -> Result<u8, String> {
    let manifest = parse_manifest_file(manifest_path).map_err(|e| e.to_string())?;

    let pb = spinner(&format!(
        "resolving {} ({})",
        manifest.package_id, manifest.fhir_version
    ));
    let manager = PackageManager::with_tracing(Arc::clone(cache));
    let result = match manager.resolve(&manifest) {
        Ok(result) => {
            spin_ok(&pb, &format!("resolved {} packages", result.len()));
            result
        }
        Err(e) => {
            spin_fail(&pb, "resolution failed");
            return Err(e.to_string());
        }
    };

    let lines: Vec<ResolvedLine> = result
        .summaries()
        .into_iter()
        .map(|(name, version)| ResolvedLine { name, version })
        .collect();

    if json {
        println!("{}", json_pretty(&lines)?);
    } else {
        for line in &lines {
            println!("{}#{}", line.name, line.version);
        }
    }
    Ok(EXIT_SUCCESS)
}
