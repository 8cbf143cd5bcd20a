//! Filesystem cache round-trips through real `.tgz` fixtures and a mock
//! HTTP registry.

use flate2::write::GzEncoder;
use flate2::Compression;
use igpack_cache::{CacheError, FsPackageCache, PackageCache};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

/// Build a gzip tarball containing a `package/package.json` manifest and any
/// extra entries.
fn package_tgz(manifest: &str, extra: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let mut append = |path: &str, data: &[u8]| {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    };
    append("package/package.json", manifest.as_bytes());
    for (path, data) in extra {
        append(path, data.as_bytes());
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Minimal single-thread registry serving `GET /<id>/<version>` from a map.
struct MockRegistry {
    addr: String,
    _handle: std::thread::JoinHandle<()>,
}

impl MockRegistry {
    fn start(tarballs: HashMap<String, Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        let store = Arc::new(Mutex::new(tarballs));

        let handle = std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).is_err() {
                        return;
                    }
                    let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                    if parts.len() < 2 {
                        return;
                    }
                    let path = parts[1].to_owned();
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                            break;
                        }
                    }

                    let data = store.lock().unwrap();
                    if let Some(body) = data.get(&path) {
                        let header = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/gzip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = stream.write_all(header.as_bytes());
                        let _ = stream.write_all(body);
                    } else {
                        let _ = stream.write_all(
                            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        );
                    }
                    let _ = stream.flush();
                });
            }
        });

        MockRegistry {
            addr,
            _handle: handle,
        }
    }
}

fn sample_manifest() -> &'static str {
    r#"{
  "name": "test.fetched",
  "version": "1.0.0",
  "canonical": "http://example.org/fhir/test",
  "dependencies": { "test.dep": "0.1.0" }
}"#
}

#[test]
fn fetch_unpacks_and_caches_package() {
    let tgz = package_tgz(
        sample_manifest(),
        &[("package/Library-a.json", r#"{ "resourceType": "Library" }"#)],
    );
    let registry = MockRegistry::start(HashMap::from([("/test.fetched/1.0.0".to_owned(), tgz)]));

    let cache_dir = tempfile::tempdir().unwrap();
    let cache = FsPackageCache::new(cache_dir.path(), registry.addr.as_str());

    let url = cache.package_url("test.fetched").unwrap();
    let pkg = cache.fetch_and_cache("test.fetched", "1.0.0", &url).unwrap();
    assert_eq!(pkg.name(), "test.fetched");
    assert_eq!(pkg.canonical(), Some("http://example.org/fhir/test"));
    assert_eq!(pkg.dependencies()[0].name, "test.dep");
    assert!(pkg.entry("package/Library-a.json").is_some());

    // Installed under the standard <id>#<version> layout
    assert!(cache_dir.path().join("test.fetched#1.0.0").is_dir());

    // And now visible to cache-only loads
    let cached = cache
        .load_from_cache_only("test.fetched", "1.0.0")
        .unwrap()
        .expect("fetched package must be cached");
    assert_eq!(cached.version(), "1.0.0");
}

#[test]
fn fetch_of_unknown_package_is_not_found() {
    let registry = MockRegistry::start(HashMap::new());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = FsPackageCache::new(cache_dir.path(), registry.addr.as_str());

    let err = cache
        .fetch_and_cache("absent.pkg", "1.0.0", "test registry")
        .unwrap_err();
    assert!(matches!(err, CacheError::NotFound { .. }));
    assert!(err.to_string().contains("absent.pkg#1.0.0"));
}

#[test]
fn fetch_against_unreachable_registry_is_http_error() {
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = FsPackageCache::new(cache_dir.path(), "http://127.0.0.1:1");
    let err = cache
        .fetch_and_cache("any.pkg", "1.0.0", "unreachable registry")
        .unwrap_err();
    assert!(matches!(err, CacheError::Http(_)));
}

#[test]
fn refetch_replaces_existing_cache_entry() {
    let v1 = package_tgz(
        r#"{ "name": "test.pkg", "version": "1.0.0" }"#,
        &[("package/old.json", "{}")],
    );
    let v2 = package_tgz(r#"{ "name": "test.pkg", "version": "1.0.0" }"#, &[]);
    let registry = MockRegistry::start(HashMap::from([("/test.pkg/1.0.0".to_owned(), v1)]));

    let cache_dir = tempfile::tempdir().unwrap();
    let cache = FsPackageCache::new(cache_dir.path(), registry.addr.as_str());
    let pkg = cache
        .fetch_and_cache("test.pkg", "1.0.0", "registry")
        .unwrap();
    assert!(pkg.entry("package/old.json").is_some());

    let registry2 = MockRegistry::start(HashMap::from([("/test.pkg/1.0.0".to_owned(), v2)]));
    let cache2 = FsPackageCache::new(cache_dir.path(), registry2.addr.as_str());
    let pkg = cache2
        .fetch_and_cache("test.pkg", "1.0.0", "registry")
        .unwrap();
    assert!(pkg.entry("package/old.json").is_none());
}

#[test]
fn tarball_without_manifest_is_malformed() {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let data = b"{}";
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "package/other.json", data.as_slice())
        .unwrap();
    let tgz = builder.into_inner().unwrap().finish().unwrap();

    let registry = MockRegistry::start(HashMap::from([("/bad.pkg/1.0.0".to_owned(), tgz)]));
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = FsPackageCache::new(cache_dir.path(), registry.addr.as_str());
    let err = cache
        .fetch_and_cache("bad.pkg", "1.0.0", "registry")
        .unwrap_err();
    assert!(matches!(err, CacheError::MalformedPackage { .. }));
}
