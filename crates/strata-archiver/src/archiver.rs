//! The archiver: incremental, content-addressed snapshots of a target set.
//!
//! One [`Archiver::snapshot`] call turns a list of filesystem targets into
//! a snapshot record naming a single root tree. When a parent snapshot is
//! supplied, entries whose metadata is unchanged are reused without
//! re-reading their bytes; everything else is re-archived. Parent data is
//! an optimization only: any failure to load it degrades to a full
//! archive of the affected subtree, never to a failed run.

use std::fs::Metadata;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use strata_core::{BlobKind, Id, Node, NodeKind, Repository, Snapshot, Timestamp, Tree};

use crate::cancel::CancelToken;
use crate::chunker::ChunkStream;
use crate::error::{ArchiveError, ArchiveResult};
use crate::fs::Filesystem;
use crate::resolve::{clean_path, resolve_relative_targets};
use crate::tree::{ArchiveDir, ArchiveTree};

/// Selection predicate: returns true for entries that should be included.
///
/// Called with the absolute path and lstat metadata of every candidate.
/// Rejected files are skipped; rejected directories are not walked.
pub type SelectFn = Box<dyn Fn(&Path, &Metadata) -> bool + Send + Sync>;

/// What the archiver decided to do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    /// The entry was archived from scratch.
    New,
    /// The prior snapshot's node was reused verbatim.
    Unchanged,
}

/// Progress callback, invoked with the logical path after each file-level
/// decision and after each completed directory.
pub type ReportFn = Box<dyn Fn(&Path, &Metadata, ReportAction) + Send + Sync>;

/// Attributes for a new snapshot.
#[derive(Default)]
pub struct Options {
    /// User-supplied tags.
    pub tags: Vec<String>,
    /// Host the snapshot is taken on.
    pub hostname: String,
    /// Exclude patterns recorded in the snapshot.
    pub excludes: Vec<String>,
    /// Snapshot time.
    pub time: Timestamp,
    /// Parent snapshot to reuse unchanged entries from.
    pub parent: Option<Id>,
}

/// Saves a directory structure into a repository as one snapshot.
pub struct Archiver<R: Repository> {
    repo: Arc<R>,
    fs: Arc<dyn Filesystem>,
    select: SelectFn,
    report: Option<ReportFn>,
}

impl<R: Repository> Archiver<R> {
    /// Create an archiver with an include-everything selector.
    pub fn new(repo: Arc<R>, fs: Arc<dyn Filesystem>) -> Self {
        Self {
            repo,
            fs,
            select: Box::new(|_, _| true),
            report: None,
        }
    }

    /// Replace the selection predicate.
    pub fn with_select(
        mut self,
        select: impl Fn(&Path, &Metadata) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.select = Box::new(select);
        self
    }

    /// Install a progress callback.
    pub fn with_report(
        mut self,
        report: impl Fn(&Path, &Metadata, ReportAction) + Send + Sync + 'static,
    ) -> Self {
        self.report = Some(Box::new(report));
        self
    }

    fn emit_report(&self, path: &Path, meta: &Metadata, action: ReportAction) {
        if let Some(report) = &self.report {
            report(path, meta, action);
        }
    }

    /// Chunk a file and save it to the repository, returning its node.
    ///
    /// The handle is opened without following symlinks and is released on
    /// every exit path, including errors and cancellation.
    pub fn save_file(&self, token: &CancelToken, path: &Path) -> ArchiveResult<Node> {
        debug!(path = %path.display(), "saving file");
        let file = self
            .fs
            .open_file(path)
            .map_err(|e| ArchiveError::io("open", path, e))?;
        let meta = file
            .metadata()
            .map_err(|e| ArchiveError::io("stat", path, e))?;
        if !meta.is_file() {
            return Err(ArchiveError::NotRegularFile {
                path: path.to_path_buf(),
            });
        }

        let mut node = Node::from_metadata(&leaf_name(path), &meta);
        for chunk in ChunkStream::new(file, self.repo.config().chunker) {
            let chunk = chunk.map_err(|e| ArchiveError::io("read", path, e))?;
            token.check()?;
            let id = self.repo.save_blob(BlobKind::Data, &chunk.data, None)?;
            token.check()?;
            node.content.push(id);
        }
        Ok(node)
    }

    /// Build a node for a non-file, non-directory entry.
    fn node_from_entry(&self, path: &Path, name: &str, meta: &Metadata) -> ArchiveResult<Node> {
        let mut node = Node::from_metadata(name, meta);
        if node.kind == NodeKind::Symlink {
            let target = self
                .fs
                .read_link(path)
                .map_err(|e| ArchiveError::io("readlink", path, e))?;
            node.link_target = Some(target.to_string_lossy().into_owned());
        }
        Ok(node)
    }

    /// Load the subtree referenced by a prior directory node.
    ///
    /// Any failure means the subtree is re-archived in full, so errors are
    /// logged and swallowed.
    fn load_subtree(&self, node: Option<&Node>) -> Option<Tree> {
        let node = node?;
        if node.kind != NodeKind::Dir {
            return None;
        }
        let id = node.subtree?;
        match self.repo.load_tree(&id) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!(tree = %id.short(), error = %err, "prior subtree unavailable, re-archiving");
                None
            }
        }
    }

    /// Archive one on-disk directory's entries into a tree.
    fn save_dir_entries(
        &self,
        token: &CancelToken,
        prefix: &Path,
        dir: &Path,
        previous: Option<&Tree>,
    ) -> ArchiveResult<Tree> {
        token.check()?;
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| ArchiveError::io("readdir", dir, e))?;

        let mut tree = Tree::new();
        for entry in entries {
            let pathname = dir.join(&entry.name);
            let abs = std::path::absolute(&pathname)
                .map_err(|e| ArchiveError::io("absolute", &pathname, e))?;
            if !(self.select)(&abs, &entry.metadata) {
                debug!(path = %pathname.display(), "excluded");
                continue;
            }

            let logical = prefix.join(&entry.name);
            let old_node = previous.and_then(|t| t.find(&entry.name));

            let node = if entry.metadata.is_file() {
                match old_node {
                    Some(old) if !file_changed(&entry.metadata, Some(old)) => {
                        debug!(path = %pathname.display(), "unchanged, reusing node");
                        self.emit_report(&logical, &entry.metadata, ReportAction::Unchanged);
                        old.clone()
                    }
                    _ => {
                        let node = self.save_file(token, &pathname)?;
                        self.emit_report(&logical, &entry.metadata, ReportAction::New);
                        node
                    }
                }
            } else if entry.metadata.is_dir() {
                let old_subtree = self.load_subtree(old_node);
                self.save_dir(token, &logical, &entry.metadata, &pathname, old_subtree.as_ref())?
            } else {
                self.node_from_entry(&pathname, &entry.name, &entry.metadata)?
            };

            tree.insert(node)?;
        }
        Ok(tree)
    }

    /// Archive a directory and return a node pointing at its saved subtree.
    pub fn save_dir(
        &self,
        token: &CancelToken,
        prefix: &Path,
        meta: &Metadata,
        dir: &Path,
        previous: Option<&Tree>,
    ) -> ArchiveResult<Node> {
        debug!(prefix = %prefix.display(), dir = %dir.display(), "saving directory");
        let tree = self.save_dir_entries(token, prefix, dir, previous)?;
        token.check()?;
        let id = self.repo.save_tree(&tree)?;

        let mut node = Node::from_metadata(&leaf_name(dir), meta);
        node.subtree = Some(id);
        self.emit_report(prefix, meta, ReportAction::New);
        Ok(node)
    }

    /// Archive a single target of any kind.
    ///
    /// Returns `None` when the selection predicate rejects the target.
    pub fn save(
        &self,
        token: &CancelToken,
        prefix: &Path,
        target: &Path,
        previous: Option<&Node>,
    ) -> ArchiveResult<Option<Node>> {
        debug!(prefix = %prefix.display(), target = %target.display(), "saving target");
        let meta = self
            .fs
            .lstat(target)
            .map_err(|e| ArchiveError::io("lstat", target, e))?;
        let abs = std::path::absolute(target)
            .map_err(|e| ArchiveError::io("absolute", target, e))?;
        if !(self.select)(&abs, &meta) {
            debug!(target = %target.display(), "excluded");
            return Ok(None);
        }

        let node = if meta.is_file() {
            match previous {
                Some(old) if !file_changed(&meta, Some(old)) => {
                    debug!(target = %target.display(), "unchanged, reusing node");
                    self.emit_report(prefix, &meta, ReportAction::Unchanged);
                    old.clone()
                }
                _ => {
                    let node = self.save_file(token, target)?;
                    self.emit_report(prefix, &meta, ReportAction::New);
                    node
                }
            }
        } else if meta.is_dir() {
            let old_subtree = self.load_subtree(previous);
            self.save_dir(token, prefix, &meta, target, old_subtree.as_ref())?
        } else {
            self.node_from_entry(target, &leaf_name(target), &meta)?
        };

        Ok(Some(node))
    }

    /// Save the logical layout, returning the tree for this level.
    pub fn save_archive_tree(
        &self,
        token: &CancelToken,
        prefix: &Path,
        atree: &ArchiveDir,
        previous: Option<&Tree>,
    ) -> ArchiveResult<Tree> {
        debug!(prefix = %prefix.display(), nodes = atree.nodes.len(), "saving archive tree");
        let mut tree = Tree::new();

        for (name, subatree) in &atree.nodes {
            match subatree {
                ArchiveTree::Leaf(path) => {
                    let old_node = previous.and_then(|t| t.find(name));
                    let Some(mut node) = self.save(token, &prefix.join(name), path, old_node)?
                    else {
                        debug!(prefix = %prefix.display(), name = %name, "excluded");
                        continue;
                    };
                    // the logical name wins over the on-disk leaf name
                    node.name = name.clone();
                    tree.insert(node)?;
                }
                ArchiveTree::Dir(sub) => {
                    let old_subtree = self.load_subtree(previous.and_then(|t| t.find(name)));
                    let subtree =
                        self.save_archive_tree(token, &prefix.join(name), sub, old_subtree.as_ref())?;
                    token.check()?;
                    let id = self.repo.save_tree(&subtree)?;

                    let fip = sub.file_info_path.as_deref().ok_or_else(|| {
                        ArchiveError::MissingFileInfoPath {
                            prefix: prefix.to_path_buf(),
                            name: name.clone(),
                        }
                    })?;
                    let meta = self
                        .fs
                        .lstat(fip)
                        .map_err(|e| ArchiveError::io("lstat", fip, e))?;

                    let mut node = Node::from_metadata(name, &meta);
                    node.subtree = Some(id);
                    tree.insert(node)?;
                }
            }
        }
        Ok(tree)
    }

    /// Load the root tree of a parent snapshot. Missing parents are never
    /// fatal: every failure path returns `None` and the run proceeds
    /// without reuse.
    fn load_parent_tree(&self, parent: Option<&Id>) -> Option<Tree> {
        let id = parent?;
        if id.is_null() {
            return None;
        }

        let sn = match self.repo.load_snapshot(id) {
            Ok(sn) => sn,
            Err(err) => {
                warn!(snapshot = %id.short(), error = %err, "parent snapshot unavailable");
                return None;
            }
        };
        let tree_id = match sn.tree {
            Some(tree_id) => tree_id,
            None => {
                warn!(snapshot = %id.short(), "parent snapshot has no tree");
                return None;
            }
        };
        match self.repo.load_tree(&tree_id) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!(tree = %tree_id.short(), error = %err, "parent tree unavailable");
                None
            }
        }
    }

    /// Archive all targets and persist a snapshot record.
    ///
    /// Returns the record together with its identifier. If the run fails
    /// or is cancelled at any point before the final persist, no snapshot
    /// exists; blobs already written remain as unreferenced garbage.
    pub fn snapshot(
        &self,
        token: &CancelToken,
        targets: &[String],
        opts: Options,
    ) -> ArchiveResult<(Snapshot, Id)> {
        if targets.is_empty() {
            return Err(ArchiveError::NoTargets);
        }

        let cleaned: Vec<String> = targets.iter().map(|t| clean_path(t)).collect();
        let resolved = resolve_relative_targets(self.fs.as_ref(), &cleaned)?;
        debug!(targets = ?resolved, "resolved targets");

        let atree = ArchiveTree::from_targets(&resolved)?;
        let parent_tree = self.load_parent_tree(opts.parent.as_ref());

        let tree = self.save_archive_tree(token, Path::new("/"), &atree, parent_tree.as_ref())?;

        token.check()?;
        let root_id = self.repo.save_tree(&tree)?;
        token.check()?;
        self.repo.flush()?;
        token.check()?;
        self.repo.save_index()?;

        let mut sn = Snapshot::new(targets.to_vec(), opts.tags, opts.hostname, opts.time);
        sn.excludes = opts.excludes;
        sn.parent = opts.parent;
        sn.tree = Some(root_id);

        token.check()?;
        let id = self.repo.save_snapshot(&sn)?;
        debug!(snapshot = %id.short(), root = %root_id.short(), "snapshot complete");
        Ok((sn, id))
    }
}

/// Decide whether a file's content changed since its node was created.
///
/// True when no usable prior node exists, or when mtime, size (checked
/// against both the plain and extended stat fields) or inode disagree.
/// The inode check catches rename-over edits that preserve size and
/// mtime; the dual size check catches filesystems where the two stat
/// paths disagree.
pub fn file_changed(meta: &Metadata, node: Option<&Node>) -> bool {
    use std::os::unix::fs::MetadataExt;

    let node = match node {
        Some(node) => node,
        None => return true,
    };

    if node.kind != NodeKind::File {
        return true;
    }

    let mtime =
        Timestamp::from_system(meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH));
    if mtime != node.mtime {
        return true;
    }

    if meta.len() != node.size || meta.size() != node.size {
        return true;
    }

    if meta.ino() != node.inode {
        return true;
    }

    false
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
