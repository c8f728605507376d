//! Parallel, deterministic source file discovery with directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel file filtering via Rayon's `par_bridge`
//! - Output sorted so downstream stages see a stable order

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::resolve::DEFAULT_EXTENSIONS;

/// Directories excluded by default (package installs, VCS, build output).
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    ".deadexport",
];

/// Checks if a directory entry should be pruned (excluded from traversal).
///
/// Called by `WalkDir::filter_entry`; the root itself is never pruned.
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Returns true if the file name ends with one of `extensions`.
///
/// Suffix match rather than `Path::extension` so `.d.ts` works.
pub fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            extensions
                .iter()
                .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
        })
}

/// Gathers all JS/TS sources under `root` with the default exclusions and extensions.
pub fn gather_source_files(root: &Path) -> Result<Vec<PathBuf>> {
    let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
    gather_source_files_with(root, &[], &extensions)
}

/// Gathers source files with extra excluded directory names and custom extensions.
pub fn gather_source_files_with(
    root: &Path,
    excludes: &[&str],
    extensions: &[String],
) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && has_source_extension(path, extensions) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to gather source files from {}", root.display()))?;

    files.sort();
    Ok(files)
}
