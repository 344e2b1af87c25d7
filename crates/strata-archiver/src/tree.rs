//! The virtual archive tree: the logical layout of a snapshot.
//!
//! User-supplied targets are arbitrary paths; the snapshot must still be a
//! single tree rooted at one identifier. `ArchiveTree` is the ephemeral
//! structure bridging the two: each target becomes a leaf at the logical
//! position its path components dictate, and interior levels remember
//! which on-disk directory supplies their metadata.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ArchiveError, ArchiveResult};
use crate::resolve::path_components;

/// A node in the logical layout, either a target to archive or an
/// interior directory grouping deeper targets.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveTree {
    /// A filesystem target to archive at this logical position.
    Leaf(PathBuf),
    /// An interior level with named children.
    Dir(ArchiveDir),
}

/// An interior node: named children plus the on-disk directory whose
/// attributes become the snapshot metadata for this level.
///
/// The root has no `file_info_path`; every other interior node gets one
/// during construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveDir {
    /// Children by logical name, in deterministic order.
    pub nodes: BTreeMap<String, ArchiveTree>,
    /// On-disk directory supplying this level's metadata.
    pub file_info_path: Option<PathBuf>,
}

impl ArchiveDir {
    fn new() -> Self {
        Self::default()
    }
}

impl ArchiveTree {
    /// Build the logical layout from resolved targets.
    ///
    /// Each target contributes exactly one leaf; overlapping targets merge
    /// into a shared interior spine. Targets must already be cleaned and
    /// bare-relative-expanded: a target without path components is an
    /// error here.
    pub fn from_targets(targets: &[String]) -> ArchiveResult<ArchiveDir> {
        let mut root = ArchiveDir::new();
        for raw in targets {
            let target = crate::resolve::clean_path(raw);
            let comps = path_components(&target);
            if comps.is_empty() {
                return Err(ArchiveError::InvalidTarget {
                    target: raw.clone(),
                });
            }

            // The physical prefix in front of the first component: "/",
            // "../" chains, or empty for plain relative targets.
            let joined = comps.join("/");
            let base = &target[..target.len() - joined.len()];

            insert_target(&mut root, base, &comps, &target);
        }
        Ok(root)
    }
}

fn insert_target(dir: &mut ArchiveDir, base: &str, comps: &[String], target: &str) {
    let name = &comps[0];
    let physical = format!("{base}{name}");

    if comps.len() == 1 {
        match dir.nodes.get_mut(name) {
            // A deeper target already created this level; the shallower
            // target now supplies its metadata.
            Some(ArchiveTree::Dir(sub)) => {
                sub.file_info_path = Some(PathBuf::from(target));
            }
            _ => {
                dir.nodes
                    .insert(name.clone(), ArchiveTree::Leaf(PathBuf::from(target)));
            }
        }
        return;
    }

    let child = dir
        .nodes
        .entry(name.clone())
        .and_modify(|existing| {
            // A shallower target claimed this name as a leaf; it becomes
            // the interior level's metadata source.
            if let ArchiveTree::Leaf(path) = existing {
                let sub = ArchiveDir {
                    nodes: BTreeMap::new(),
                    file_info_path: Some(path.clone()),
                };
                *existing = ArchiveTree::Dir(sub);
            }
        })
        .or_insert_with(|| {
            ArchiveTree::Dir(ArchiveDir {
                nodes: BTreeMap::new(),
                file_info_path: Some(PathBuf::from(&physical)),
            })
        });

    if let ArchiveTree::Dir(sub) = child {
        insert_target(sub, &format!("{physical}/"), &comps[1..], target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir<'a>(tree: &'a ArchiveDir, name: &str) -> &'a ArchiveDir {
        match tree.nodes.get(name) {
            Some(ArchiveTree::Dir(sub)) => sub,
            other => panic!("{name} is not a dir: {other:?}"),
        }
    }

    fn leaf<'a>(tree: &'a ArchiveDir, name: &str) -> &'a PathBuf {
        match tree.nodes.get(name) {
            Some(ArchiveTree::Leaf(path)) => path,
            other => panic!("{name} is not a leaf: {other:?}"),
        }
    }

    #[test]
    fn single_target_single_leaf() {
        let root = ArchiveTree::from_targets(&["hello.txt".to_string()]).unwrap();
        assert_eq!(root.nodes.len(), 1);
        assert_eq!(leaf(&root, "hello.txt"), &PathBuf::from("hello.txt"));
    }

    #[test]
    fn nested_target_builds_spine() {
        let root = ArchiveTree::from_targets(&["a/b/c".to_string()]).unwrap();
        let a = dir(&root, "a");
        assert_eq!(a.file_info_path, Some(PathBuf::from("a")));
        let b = dir(a, "b");
        assert_eq!(b.file_info_path, Some(PathBuf::from("a/b")));
        assert_eq!(leaf(b, "c"), &PathBuf::from("a/b/c"));
    }

    #[test]
    fn absolute_target_keeps_rooted_prefix() {
        let root = ArchiveTree::from_targets(&["/var/data".to_string()]).unwrap();
        let var = dir(&root, "var");
        assert_eq!(var.file_info_path, Some(PathBuf::from("/var")));
        assert_eq!(leaf(var, "data"), &PathBuf::from("/var/data"));
    }

    #[test]
    fn parent_relative_target_keeps_prefix() {
        let root = ArchiveTree::from_targets(&["../d/f".to_string()]).unwrap();
        let d = dir(&root, "d");
        assert_eq!(d.file_info_path, Some(PathBuf::from("../d")));
        assert_eq!(leaf(d, "f"), &PathBuf::from("../d/f"));
    }

    #[test]
    fn siblings_merge_into_shared_spine() {
        let root =
            ArchiveTree::from_targets(&["a/b".to_string(), "a/c".to_string()]).unwrap();
        assert_eq!(root.nodes.len(), 1);
        let a = dir(&root, "a");
        assert_eq!(a.nodes.len(), 2);
        assert_eq!(leaf(a, "b"), &PathBuf::from("a/b"));
        assert_eq!(leaf(a, "c"), &PathBuf::from("a/c"));
    }

    #[test]
    fn leaf_then_deeper_target_converts_to_dir() {
        let root = ArchiveTree::from_targets(&["a".to_string(), "a/b".to_string()]).unwrap();
        let a = dir(&root, "a");
        assert_eq!(a.file_info_path, Some(PathBuf::from("a")));
        assert_eq!(leaf(a, "b"), &PathBuf::from("a/b"));
    }

    #[test]
    fn deeper_target_then_prefix_sets_file_info_path() {
        let root = ArchiveTree::from_targets(&["a/b".to_string(), "a".to_string()]).unwrap();
        let a = dir(&root, "a");
        assert_eq!(a.file_info_path, Some(PathBuf::from("a")));
        assert_eq!(leaf(a, "b"), &PathBuf::from("a/b"));
    }

    #[test]
    fn duplicate_targets_are_idempotent() {
        let root =
            ArchiveTree::from_targets(&["a/b".to_string(), "a/b".to_string()]).unwrap();
        let a = dir(&root, "a");
        assert_eq!(a.nodes.len(), 1);
    }

    #[test]
    fn bare_relative_target_is_rejected() {
        let err = ArchiveTree::from_targets(&[".".to_string()]).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidTarget { .. }));
    }
}
