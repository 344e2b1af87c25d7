//! Filesystem entry metadata as persisted in a tree.

use std::fs::Metadata;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::types::Timestamp;

/// The kind of filesystem entry a node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link.
    Symlink,
    /// Character device.
    Chardev,
    /// Block device.
    Blockdev,
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
}

impl NodeKind {
    /// Classify a file type obtained from an lstat result.
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_file() {
            NodeKind::File
        } else if ft.is_dir() {
            NodeKind::Dir
        } else if ft.is_symlink() {
            NodeKind::Symlink
        } else if ft.is_char_device() {
            NodeKind::Chardev
        } else if ft.is_block_device() {
            NodeKind::Blockdev
        } else if ft.is_fifo() {
            NodeKind::Fifo
        } else {
            NodeKind::Socket
        }
    }
}

/// Metadata record for one filesystem entry within a [`crate::Tree`].
///
/// Exactly one payload is populated, matching `kind`: `content` for files,
/// `subtree` for directories, `link_target` for symlinks. Nodes are built
/// once from an lstat result and never mutated after their enclosing tree
/// has been hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Leaf name, unique within the enclosing tree.
    pub name: String,
    /// Entry kind.
    pub kind: NodeKind,
    /// Unix mode bits, including the file type bits.
    pub mode: u32,
    /// Modification time.
    pub mtime: Timestamp,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Size in bytes as reported by lstat.
    pub size: u64,
    /// Inode number, the stable filesystem identity of the entry.
    pub inode: u64,
    /// For files: ordered data-blob ids whose concatenation is the body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Id>,
    /// For directories: the identifier of the subtree listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtree: Option<Id>,
    /// For symlinks: the link target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

impl Node {
    /// Build a node from an lstat result.
    ///
    /// Payload fields start empty; the archiver fills `content`, `subtree`
    /// or `link_target` according to the kind.
    pub fn from_metadata(name: &str, meta: &Metadata) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::from_file_type(meta.file_type()),
            mode: meta.mode(),
            mtime: Timestamp::from_system(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.len(),
            inode: meta.ino(),
            content: Vec::new(),
            subtree: None,
            link_target: None,
        }
    }
}
