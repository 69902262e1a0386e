//! Parallel, deterministic discovery of C-family source files.
//!
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel entry processing via Rayon's `par_bridge`
//! - Sorted output so reports are stable between runs

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories to exclude by default.
pub const EXCLUDED_DIRS: &[&str] = &[".git", ".svn", "target", "node_modules", "build"];

/// Extensions scanned by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx"];

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Whether `path` has one of `extensions` (case-insensitive, no leading dot).
pub fn has_source_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|e| e.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Gathers all source files below `root`.
///
/// Combines [`EXCLUDED_DIRS`] with `excludes` for subtree skipping.
pub fn gather_source_files<S: AsRef<str> + Sync>(
    root: &Path,
    extensions: &[S],
    excludes: &[S],
) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().map(|e| e.as_ref()))
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

/// Expands command-line inputs into the list of files to check.
///
/// Files named explicitly are taken as-is, whatever their extension;
/// directories are walked with [`gather_source_files`]. Duplicates are removed.
pub fn collect_inputs<S: AsRef<str> + Sync>(
    inputs: &[PathBuf],
    extensions: &[S],
    excludes: &[S],
) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let found = if input.is_dir() {
            gather_source_files(input, extensions, excludes)?
        } else if input.exists() {
            vec![input.clone()]
        } else {
            anyhow::bail!("No such file or directory: {}", input.display());
        };

        for file in found {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    Ok(files)
}
