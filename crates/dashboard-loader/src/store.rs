//! Filesystem operations on the dashboard tree.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// The operations the reconciler performs below the output root.
pub trait DashboardStore: Send + Sync {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Names of all entries directly inside `dir`.
    fn list(&self, dir: &Path) -> io::Result<BTreeSet<OsString>>;

    /// True if `path` is a regular file holding exactly `content`.
    fn content_matches(&self, path: &Path, content: &[u8]) -> bool;

    /// Writes `content` as a regular file at `path`.
    ///
    /// Never writes through a symlink.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Removes a file, symlink or whole directory tree.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl DashboardStore for LocalStore {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn list(&self, dir: &Path) -> io::Result<BTreeSet<OsString>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            names.insert(entry?.file_name());
        }
        Ok(names)
    }

    fn content_matches(&self, path: &Path, content: &[u8]) -> bool {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() == content.len() as u64 => {
                fs::read(path).map(|current| current == content).unwrap_or(false)
            }
            _ => false,
        }
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        // A symlink would redirect the write outside the tree; a directory
        // would make it fail. Either is replaced by a plain file.
        match fs::symlink_metadata(path) {
            Ok(meta) if !meta.is_file() => self.remove(path)?,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::write(path, content)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}
