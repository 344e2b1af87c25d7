//! Filesystem access behind a trait seam.
//!
//! The archiver never touches `std::fs` directly; everything flows through
//! [`Filesystem`] so tests and alternative backends can substitute their
//! own implementation. Semantics are lstat-based throughout: symlinks are
//! archived as themselves, never followed.

use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// One directory entry: leaf name plus its lstat metadata.
#[derive(Debug)]
pub struct DirEntryInfo {
    /// Leaf name of the entry.
    pub name: String,
    /// Metadata from lstat (symlinks not followed).
    pub metadata: Metadata,
}

/// Filesystem operations the archiver requires.
pub trait Filesystem: Send + Sync {
    /// Open a regular file read-only without following symlinks.
    fn open_file(&self, path: &Path) -> io::Result<File>;

    /// Stat without following symlinks.
    fn lstat(&self, path: &Path) -> io::Result<Metadata>;

    /// Enumerate a directory: names and lstat metadata, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Enumerate a directory's entry names, sorted.
    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Read a symlink's target.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The local operating-system filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn open_file(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(path)
    }

    fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        std::fs::symlink_metadata(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let metadata = std::fs::symlink_metadata(entry.path())?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                metadata,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }
}
