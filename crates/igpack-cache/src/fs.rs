use crate::{CacheError, Package, PackageCache};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Filesystem package cache backed by an HTTP package registry.
///
/// Cached packages live unpacked under `<root>/<id>#<version>/`, the layout
/// used by the standard FHIR package cache. Fetches download
/// `<registry>/<id>/<version>` as a gzip tarball and install it atomically:
/// unpack into a sibling staging directory, then rename into place.
pub struct FsPackageCache {
    root: PathBuf,
    registry: String,
    agent: ureq::Agent,
}

impl FsPackageCache {
    pub fn new(root: impl Into<PathBuf>, registry: impl Into<String>) -> Self {
        let registry = registry.into().trim_end_matches('/').to_owned();
        Self {
            root: root.into(),
            registry,
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn package_dir(&self, id: &str, version: &str) -> PathBuf {
        self.root.join(format!("{id}#{version}"))
    }

    fn load_dir(&self, id: &str, version: &str, dir: &Path) -> Result<Package, CacheError> {
        let mut entries = BTreeMap::new();
        collect_entries(dir, dir, &mut entries)?;
        Package::from_entries(id, version, entries)
    }

    fn download(&self, url: &str, id: &str, version: &str) -> Result<Vec<u8>, CacheError> {
        debug!("GET {url}");
        let resp = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(CacheError::NotFound {
                    id: id.to_owned(),
                    version: version.to_owned(),
                });
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(CacheError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => return Err(CacheError::Http(e.to_string())),
        };
        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| CacheError::Http(e.to_string()))?;
        Ok(body)
    }
}

impl PackageCache for FsPackageCache {
    fn load_from_cache_only(
        &self,
        id: &str,
        version: &str,
    ) -> Result<Option<Arc<Package>>, CacheError> {
        let dir = self.package_dir(id, version);
        if !dir.is_dir() {
            return Ok(None);
        }
        debug!("cache hit for {id}#{version}");
        let pkg = self.load_dir(id, version, &dir)?;
        Ok(Some(Arc::new(pkg)))
    }

    fn fetch_and_cache(
        &self,
        id: &str,
        version: &str,
        source_desc: &str,
    ) -> Result<Arc<Package>, CacheError> {
        info!("fetching {id}#{version} from {source_desc}");
        fs::create_dir_all(&self.root)?;

        let url = format!("{}/{id}/{version}", self.registry);
        let bytes = self.download(&url, id, version)?;

        let staging = tempfile::tempdir_in(&self.root)?;
        unpack_tgz(&bytes, staging.path(), id, version)?;

        let dest = self.package_dir(id, version);
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        fs::rename(staging.keep(), &dest)?;

        let pkg = self.load_dir(id, version, &dest)?;
        Ok(Arc::new(pkg))
    }

    fn package_url(&self, id: &str) -> Result<String, CacheError> {
        Ok(format!("{}/{id}", self.registry))
    }
}

/// Read every regular file below `dir` into a path-keyed map, with paths
/// relative to `base` and normalized to forward slashes.
fn collect_entries(
    base: &Path,
    dir: &Path,
    entries: &mut BTreeMap<String, Vec<u8>>,
) -> Result<(), CacheError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_entries(base, &path, entries)?;
        } else if path.is_file() {
            let Ok(rel) = path.strip_prefix(base) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.insert(key, fs::read(&path)?);
        }
    }
    Ok(())
}

/// Unpack a gzip tarball into `dest`, rejecting entries that would escape it.
fn unpack_tgz(bytes: &[u8], dest: &Path, id: &str, version: &str) -> Result<(), CacheError> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(CacheError::MalformedPackage {
                id: id.to_owned(),
                version: version.to_owned(),
                reason: format!("unsafe archive path: {}", path.display()),
            });
        }
        let target = dest.join(&path);
        match entry.header().entry_type() {
            tar::EntryType::Directory => fs::create_dir_all(&target)?,
            tar::EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut contents = Vec::new();
                entry.read_to_end(&mut contents)?;
                fs::write(&target, contents)?;
            }
            // Links and special files have no place in a package container.
            other => {
                return Err(CacheError::MalformedPackage {
                    id: id.to_owned(),
                    version: version.to_owned(),
                    reason: format!("unsupported archive entry type {other:?}"),
                });
            }
        }
    }
    Ok(())
}
