//! Target normalization: lexical path cleaning and bare-relative expansion.

use std::path::Path;

use tracing::debug;

use crate::error::{ArchiveError, ArchiveResult};
use crate::fs::Filesystem;

/// Lexically clean a path: collapse `.`, resolve `..`, drop duplicate and
/// trailing separators. The empty path cleans to `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|c| *c != "..") {
                    out.pop();
                } else if !rooted {
                    // relative paths keep leading ".." components
                    out.push("..");
                }
            }
            _ => out.push(comp),
        }
    }

    let joined = out.join("/");
    match (rooted, joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// The real path components of a cleaned target: everything except empty
/// components, `.` and `..`.
///
/// A target with zero components (`.`, `..`, `../..`, `/`) is
/// bare-relative: it names a directory only by reference to the current
/// position and must be expanded before a logical tree can be built.
pub fn path_components(path: &str) -> Vec<String> {
    clean_path(path)
        .split('/')
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .map(str::to_string)
        .collect()
}

/// Replace bare-relative targets with their direct children.
///
/// A snapshot of `.` must contain the working directory's children at the
/// top level, not a single entry named `.`. Targets with real components
/// pass through unchanged.
pub fn resolve_relative_targets(
    fs: &dyn Filesystem,
    targets: &[String],
) -> ArchiveResult<Vec<String>> {
    let mut result = Vec::with_capacity(targets.len());
    for target in targets {
        if !path_components(target).is_empty() {
            result.push(target.clone());
            continue;
        }

        debug!(target = %target, "expanding bare-relative target");
        let names = fs
            .read_dir_names(Path::new(target))
            .map_err(|e| ArchiveError::io("readdir", target.clone(), e))?;
        for name in names {
            result.push(clean_path(&format!("{target}/{name}")));
        }
    }
    Ok(result)
}
