//! Filesystem access for the file-based cleanup tasks.
//!
//! The tasks only need a flat view: the immediate subdirectories of the
//! storage root and the regular files directly inside one of them.
//! Symbolic links are never followed, so a link planted in the storage
//! root can't steer a recursive delete outside of it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ReaperError, Result};

/// An immediate subdirectory of a scanned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the directory.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
}

/// A regular file inside a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Directory listing and deletion.
pub trait FileSystem: Send + Sync {
    /// List the immediate subdirectories of `root`.
    ///
    /// A missing `root` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` exists but cannot be read.
    fn list_subdirectories(&self, root: &Path) -> Result<Vec<DirEntry>>;

    /// List the regular files directly inside `dir` accepted by `filter`.
    ///
    /// A missing `dir` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` exists but cannot be read.
    fn list_files(
        &self,
        dir: &Path,
        filter: &dyn Fn(&FileEntry) -> bool,
    ) -> Result<Vec<FileEntry>>;

    /// Delete a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Delete a directory and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the tree cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// `FileSystem` backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a new local filesystem handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Open `dir` for listing, treating a missing directory as empty.
    fn read_dir(dir: &Path) -> Result<Option<fs::ReadDir>> {
        match fs::read_dir(dir) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReaperError::io(dir, e)),
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn list_subdirectories(&self, root: &Path) -> Result<Vec<DirEntry>> {
        let Some(entries) = Self::read_dir(root)? else {
            return Ok(Vec::new());
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            // file_type() does not follow symlinks
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            dirs.push(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dirs)
    }

    fn list_files(
        &self,
        dir: &Path,
        filter: &dyn Fn(&FileEntry) -> bool,
    ) -> Result<Vec<FileEntry>> {
        let Some(entries) = Self::read_dir(dir)? else {
            return Ok(Vec::new());
        };

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "No modification time");
                    continue;
                }
            };
            let file = FileEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                modified,
            };
            if filter(&file) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| ReaperError::io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| ReaperError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn missing_root_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();

        let missing = tmp.path().join("nope");
        assert!(fs.list_subdirectories(&missing).unwrap().is_empty());
        assert!(fs.list_files(&missing, &|_| true).unwrap().is_empty());
    }

    #[test]
    fn subdirectories_skip_plain_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("42")).unwrap();
        fs::create_dir(tmp.path().join("hibernate")).unwrap();
        touch(&tmp.path().join("7"));

        let dirs = LocalFileSystem::new()
            .list_subdirectories(tmp.path())
            .unwrap();
        let names: Vec<_> = dirs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["42", "hibernate"]);
        assert_eq!(dirs[0].path, tmp.path().join("42"));
    }

    #[test]
    fn list_files_applies_filter_and_skips_directories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("TEST_SETUP_1.webm"));
        touch(&tmp.path().join("slides.pdf"));
        fs::create_dir(tmp.path().join("TEST_SETUP_dir")).unwrap();

        let fs = LocalFileSystem::new();
        let all = fs.list_files(tmp.path(), &|_| true).unwrap();
        assert_eq!(all.len(), 2);

        let setup = fs
            .list_files(tmp.path(), &|f| f.name.starts_with("TEST_SETUP_"))
            .unwrap();
        assert_eq!(setup.len(), 1);
        assert_eq!(setup[0].name, "TEST_SETUP_1.webm");
    }

    #[test]
    fn list_files_reports_modification_time() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("old.bin");
        touch(&path);
        let then = SystemTime::now() - Duration::from_secs(7200);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(then)
            .unwrap();

        let files = LocalFileSystem::new()
            .list_files(tmp.path(), &|_| true)
            .unwrap();
        let age = Utc::now() - files[0].modified;
        assert!(age >= chrono::Duration::seconds(7199));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_listed() {
        let tmp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("99")).unwrap();

        let dirs = LocalFileSystem::new()
            .list_subdirectories(tmp.path())
            .unwrap();
        assert!(dirs.is_empty());
    }

    #[test]
    fn remove_and_exists() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();

        let file = tmp.path().join("a");
        touch(&file);
        assert!(fs.exists(&file));
        fs.remove_file(&file).unwrap();
        assert!(!fs.exists(&file));

        let dir = tmp.path().join("42");
        fs::create_dir_all(dir.join("nested")).unwrap();
        touch(&dir.join("nested").join("b"));
        fs.remove_dir_all(&dir).unwrap();
        assert!(!fs.exists(&dir));
    }

    #[test]
    fn remove_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = LocalFileSystem::new()
            .remove_file(&tmp.path().join("ghost"))
            .unwrap_err();
        assert!(matches!(err, ReaperError::Io { .. }));
    }
}
