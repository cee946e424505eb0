//! Serve-time lookup of fingerprinted asset paths.
//!
//! A [`Resolver`] decodes a manifest once and answers [`Resolver::path`]
//! queries from that snapshot without ever touching storage again. The
//! snapshot lives behind `arc-swap`, so lookups are lock-free and an explicit
//! [`Resolver::reload`] replaces it atomically: a concurrent reader observes
//! either the old manifest or the new one, never a mix.
//!
//! # Example
//!
//! ```ignore
//! let resolver = Resolver::load(&DirProvider::new("public"), "dist/manifest.json")?;
//! assert_eq!(resolver.path("app.js"), "/dist/app-a1b2c3d4.js");
//! assert_eq!(resolver.path("missing.js"), "/dist/missing.js");
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::ResolveError;
use crate::manifest::Manifest;

/// Mount point assets are served under unless overridden.
pub const DEFAULT_MOUNT: &str = "/dist";

/// Read-only hierarchical file source.
///
/// The resolver only ever opens one named file; it never writes, deletes or
/// lists.
pub trait FileProvider {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;
}

/// Files under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirProvider {
    root: PathBuf,
}

impl DirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProvider for DirProvider {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.root.join(path.trim_start_matches('/')))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Maps original asset paths to served, fingerprinted paths.
#[derive(Debug)]
pub struct Resolver {
    manifest: ArcSwap<Manifest>,
    mount: String,
}

impl Resolver {
    /// Decode the manifest at `manifest_path` from `provider`.
    pub fn load(provider: &dyn FileProvider, manifest_path: &str) -> Result<Self, ResolveError> {
        let manifest = read_manifest(provider, manifest_path)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Wrap an already decoded manifest.
    pub fn from_manifest(manifest: Manifest) -> Self {
        Self {
            manifest: ArcSwap::from_pointee(manifest),
            mount: DEFAULT_MOUNT.to_string(),
        }
    }

    /// Serve under `mount` instead of [`DEFAULT_MOUNT`].
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Served path for `asset`.
    ///
    /// Unmapped assets fall back to the original path under the mount, so a
    /// missing entry degrades to serving the file as-is.
    pub fn path(&self, asset: &str) -> String {
        let manifest = self.manifest.load();
        let target = manifest.get(asset).unwrap_or(asset);
        join_mount(&self.mount, target)
    }

    /// Replace the snapshot with a freshly decoded manifest.
    ///
    /// On error the current snapshot stays in place.
    pub fn reload(
        &self,
        provider: &dyn FileProvider,
        manifest_path: &str,
    ) -> Result<(), ResolveError> {
        let manifest = read_manifest(provider, manifest_path)?;
        self.manifest.store(Arc::new(manifest));
        Ok(())
    }

    /// The manifest currently in use.
    pub fn snapshot(&self) -> Arc<Manifest> {
        self.manifest.load_full()
    }

    pub fn len(&self) -> usize {
        self.manifest.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.load().is_empty()
    }
}

fn read_manifest(provider: &dyn FileProvider, path: &str) -> Result<Manifest, ResolveError> {
    let reader = provider
        .open(path)
        .map_err(|source| ResolveError::ManifestMissing {
            path: path.to_string(),
            source,
        })?;
    Manifest::from_reader(reader).map_err(|source| ResolveError::ManifestMalformed {
        path: path.to_string(),
        source,
    })
}

/// Join `rel` under `mount` with single `/` separators.
///
/// Empty and `.` segments are dropped; `..` pops a previous segment of `rel`
/// but never climbs out of the mount.
fn join_mount(mount: &str, rel: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mount = mount.trim_end_matches('/');
    let mut out = String::with_capacity(mount.len() + rel.len() + 1);
    out.push_str(mount);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryFs;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str =
        r#"{"assets":{"app.js":"app-12345678.js","style.css":"style-87654321.css"}}"#;

    fn provider(content: &str) -> MemoryFs {
        MemoryFs::with_files([("manifest.json", content)])
    }

    #[test]
    fn test_load_valid_manifest() {
        let resolver = Resolver::load(&provider(MANIFEST), "manifest.json").unwrap();
        assert_eq!(resolver.len(), 2);
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.get("app.js"), Some("app-12345678.js"));
        assert_eq!(snapshot.get("style.css"), Some("style-87654321.css"));
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = Resolver::load(&MemoryFs::new(), "manifest.json").unwrap_err();
        assert!(matches!(err, ResolveError::ManifestMissing { .. }));
    }

    #[test]
    fn test_load_malformed_manifest() {
        for bad in [
            r#"{"assets":invalid_json}"#,
            r#"{"assets": "not-an-object"}"#,
            r#"{"other": {}}"#,
        ] {
            let err = Resolver::load(&provider(bad), "manifest.json").unwrap_err();
            assert!(matches!(err, ResolveError::ManifestMalformed { .. }), "{bad}");
        }
    }

    #[test]
    fn test_path_lookup_and_fallback() {
        let resolver = Resolver::load(&provider(MANIFEST), "manifest.json").unwrap();
        assert_eq!(resolver.path("app.js"), "/dist/app-12345678.js");
        assert_eq!(resolver.path("style.css"), "/dist/style-87654321.css");
        assert_eq!(resolver.path("unknown.js"), "/dist/unknown.js");
        assert_eq!(resolver.path("missing.js"), "/dist/missing.js");
    }

    #[test]
    fn test_custom_mount() {
        let manifest = [("app.js", "app-deadbeef.js")].into_iter().collect();
        let resolver = Resolver::from_manifest(manifest).with_mount("/static/");
        assert_eq!(resolver.mount(), "/static/");
        assert_eq!(resolver.path("app.js"), "/static/app-deadbeef.js");
        assert_eq!(resolver.path("js/x.js"), "/static/js/x.js");
    }

    #[test]
    fn test_join_mount_cleans_segments() {
        assert_eq!(join_mount("/dist", "app.js"), "/dist/app.js");
        assert_eq!(join_mount("/dist/", "/app.js"), "/dist/app.js");
        assert_eq!(join_mount("/dist", "./a//b.js"), "/dist/a/b.js");
        assert_eq!(join_mount("/dist", "a/../b.js"), "/dist/b.js");
        assert_eq!(join_mount("/dist", "../../etc/passwd"), "/dist/etc/passwd");
        assert_eq!(join_mount("/dist", ""), "/dist");
        assert_eq!(join_mount("", ""), "/");
    }

    #[test]
    fn test_concurrent_reads() {
        let resolver = Resolver::load(&provider(MANIFEST), "manifest.json").unwrap();
        std::thread::scope(|s| {
            for i in 0..128 {
                let resolver = &resolver;
                s.spawn(move || {
                    assert_eq!(resolver.path("app.js"), "/dist/app-12345678.js");
                    assert_eq!(
                        resolver.path(&format!("missing-{i}.js")),
                        format!("/dist/missing-{i}.js")
                    );
                });
            }
        });
    }

    #[test]
    fn test_reload_is_atomic_for_readers() {
        let old = provider(r#"{"assets":{"a.js":"a-1.js","b.js":"b-1.js"}}"#);
        let new = provider(r#"{"assets":{"a.js":"a-2.js","b.js":"b-2.js"}}"#);
        let resolver = Resolver::load(&old, "manifest.json").unwrap();

        std::thread::scope(|s| {
            for _ in 0..128 {
                let resolver = &resolver;
                s.spawn(move || {
                    for _ in 0..50 {
                        let snapshot = resolver.snapshot();
                        let a = snapshot.get("a.js").unwrap();
                        let b = snapshot.get("b.js").unwrap();
                        // Both entries always come from the same manifest
                        assert_eq!(a.ends_with("-1.js"), b.ends_with("-1.js"));
                    }
                });
            }
            let resolver = &resolver;
            let (old, new) = (&old, &new);
            s.spawn(move || {
                for i in 0..50 {
                    let source = if i % 2 == 0 { new } else { old };
                    resolver.reload(source, "manifest.json").unwrap();
                }
            });
        });
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let resolver = Resolver::load(&provider(MANIFEST), "manifest.json").unwrap();
        assert!(resolver.reload(&provider("{"), "manifest.json").is_err());
        assert_eq!(resolver.path("app.js"), "/dist/app-12345678.js");
    }

    #[test]
    fn test_dir_provider() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/manifest.json"), MANIFEST).unwrap();

        let provider = DirProvider::new(dir.path());
        assert_eq!(provider.root(), dir.path());
        let resolver = Resolver::load(&provider, "dist/manifest.json").unwrap();
        assert_eq!(resolver.path("app.js"), "/dist/app-12345678.js");
        assert_eq!(resolver.path("unknown.js"), "/dist/unknown.js");

        assert!(Resolver::load(&provider, "missing.json").is_err());
    }
}
