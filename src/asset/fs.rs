//! Filesystem capability used by the pipeline.
//!
//! The pipeline never touches `std::fs` directly; it goes through [`AssetFs`]
//! so tests can run it against [`MemoryFs`] instead of a real directory.
//!
//! ```text
//! AssetFs
//! ├── DiskFs     # real disk, jwalk traversal, 0644 output files
//! └── MemoryFs   # in-memory tree, also a resolver FileProvider
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use jwalk::WalkDir;
use parking_lot::RwLock;

use crate::resolver::FileProvider;

/// Mode for every written asset: owner read/write, everyone else read.
pub const OUTPUT_FILE_MODE: u32 = 0o644;

/// Capability to enumerate, read, write and remove files.
///
/// Implementations must be `Sync`: parallel builds call `read` and `write`
/// from rayon workers.
pub trait AssetFs: Sync {
    /// Recursively list every regular file under `root`.
    ///
    /// Directories are not returned. Fails if `root` does not exist or is not
    /// a directory.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a whole file, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Create a directory and all its parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory tree. Succeeds if `path` does not exist.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Lexically normalized form of `path`, used to compare roots.
    fn normalize(&self, path: &Path) -> PathBuf {
        lexical_normalize(path)
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the start of a relative path is kept, since there is nothing to pop.
/// A path that collapses to nothing (`.`, `a/..`) becomes the empty path,
/// which every relative path starts with.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

impl<T: AssetFs + ?Sized> AssetFs for &T {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).list_files(root)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        (**self).normalize(path)
    }
}

// ============================================================================
// DiskFs
// ============================================================================

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl AssetFs for DiskFs {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let meta = fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("`{}` is not a directory", root.display()),
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).skip_hidden(false) {
            let entry = entry.map_err(io::Error::other)?;
            let file_type = entry.file_type();
            if file_type.is_file() {
                files.push(entry.path());
            } else if file_type.is_symlink() {
                // Linked files are read through the link; linked directories
                // are not descended into. A dangling link fails at read time.
                let path = entry.path();
                match fs::metadata(&path) {
                    Ok(meta) if meta.is_dir() => {}
                    _ => files.push(path),
                }
            }
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(OUTPUT_FILE_MODE);
        }
        let mut file = options.open(path)?;
        file.write_all(contents)?;

        // Creation mode is filtered through the umask; pin it explicitly.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(OUTPUT_FILE_MODE))?;
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        lexical_normalize(&absolute)
    }
}

// ============================================================================
// MemoryFs
// ============================================================================

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryTree {
    fn add_dirs(&mut self, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// An in-memory file tree.
///
/// Paths are normalized lexically, so `a/./b.js` and `a/b.js` name the same
/// file. Directories exist implicitly once a file is written beneath them.
#[derive(Debug, Default)]
pub struct MemoryFs {
    tree: RwLock<MemoryTree>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(path, contents)` pairs.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: AsRef<Path>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        for (path, contents) in files {
            fs.insert(path, contents);
        }
        fs
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = lexical_normalize(path.as_ref());
        let mut tree = self.tree.write();
        if let Some(parent) = path.parent() {
            tree.add_dirs(parent);
        }
        tree.files.insert(path, contents.into());
    }

    /// Remove a single file, returning its contents.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = lexical_normalize(path.as_ref());
        self.tree.write().files.remove(&path)
    }

    /// Contents of a file, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = lexical_normalize(path.as_ref());
        self.tree.read().files.get(&path).cloned()
    }

    /// Every file path currently stored, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.tree.read().files.keys().cloned().collect()
    }
}

impl AssetFs for MemoryFs {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let norm = lexical_normalize(root);
        let tree = self.tree.read();
        if tree.files.contains_key(&norm) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("`{}` is not a directory", root.display()),
            ));
        }
        if !tree.dirs.contains(&norm) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` does not exist", root.display()),
            ));
        }
        // Report paths under `root` as spelled by the caller
        Ok(tree
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&norm).ok())
            .map(|rel| root.join(rel))
            .collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` does not exist", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut tree = self.tree.write();
        if tree.dirs.contains(&path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("`{}` is a directory", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            if parent.ancestors().any(|dir| tree.files.contains_key(dir)) {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("a parent of `{}` is a file", path.display()),
                ));
            }
            tree.add_dirs(parent);
        }
        tree.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut tree = self.tree.write();
        if path.ancestors().any(|dir| tree.files.contains_key(dir)) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("`{}` or a parent is a file", path.display()),
            ));
        }
        tree.add_dirs(&path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut tree = self.tree.write();
        tree.files.retain(|file, _| !file.starts_with(&path));
        tree.dirs.retain(|dir| !dir.starts_with(&path));
        Ok(())
    }
}

impl FileProvider for MemoryFs {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let bytes = AssetFs::read(self, Path::new(path))?;
        Ok(Box::new(io::Cursor::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(lexical_normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(lexical_normalize(Path::new("./")), PathBuf::new());
        assert_eq!(lexical_normalize(Path::new("a/..")), PathBuf::new());
        assert_eq!(lexical_normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(lexical_normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn test_memory_list_files_is_recursive() {
        let fs = MemoryFs::with_files([
            ("src/app.js", "a"),
            ("src/css/site.css", "b"),
            ("other/x.js", "c"),
        ]);
        let files = fs.list_files(Path::new("src")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("src/app.js"), PathBuf::from("src/css/site.css")]
        );
    }

    #[test]
    fn test_memory_list_keeps_caller_spelling() {
        let fs = MemoryFs::with_files([("src/app.js", "a")]);
        let files = fs.list_files(Path::new("./src")).unwrap();
        assert_eq!(files, vec![PathBuf::from("./src/app.js")]);
    }

    #[test]
    fn test_memory_list_missing_root() {
        let fs = MemoryFs::new();
        let err = fs.list_files(Path::new("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_remove_dir_all() {
        let fs = MemoryFs::with_files([("out/a.js", "a"), ("out/sub/b.js", "b"), ("keep.js", "k")]);
        fs.remove_dir_all(Path::new("out")).unwrap();
        assert_eq!(fs.paths(), vec![PathBuf::from("keep.js")]);
        assert!(fs.list_files(Path::new("out")).is_err());
        // Removing again is fine
        fs.remove_dir_all(Path::new("out")).unwrap();
    }

    #[test]
    fn test_memory_write_under_file_fails() {
        let fs = MemoryFs::with_files([("blocker", "x")]);
        assert!(fs.write(Path::new("blocker/a.js"), b"a").is_err());
        assert!(fs.create_dir_all(Path::new("blocker/sub")).is_err());
    }

    #[test]
    fn test_disk_list_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/empty")).unwrap();
        fs::write(dir.path().join("sub/a.js"), "a").unwrap();
        fs::write(dir.path().join(".hidden.css"), "b").unwrap();

        let mut files = DiskFs.list_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![dir.path().join(".hidden.css"), dir.path().join("sub/a.js")]
        );
    }

    #[test]
    fn test_disk_list_files_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.js");
        fs::write(&file, "a").unwrap();
        assert!(DiskFs.list_files(&file).is_err());
        assert!(DiskFs.list_files(&dir.path().join("missing")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_write_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep/nested/app.js");
        DiskFs.write(&path, b"x").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, OUTPUT_FILE_MODE);
        assert_eq!(fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn test_disk_remove_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        DiskFs.remove_dir_all(&dir.path().join("absent")).unwrap();
    }
}
