//! Project file discovery.
//!
//! Walks the project with the `ignore` crate so `.gitignore` and hidden
//! files are respected, then keeps files with a configured extension.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use stamp_core::{EntryId, SourceFile};

use crate::error::{CliError, Result};

/// Directories never scanned, wherever they appear.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "out", "coverage", "target"];

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Candidate source files under `root`, sorted by entry id.
///
/// Unreadable directory entries are logged and skipped.
pub fn scan(root: &Path, extensions: &[String]) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(CliError::Scan {
            root: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false);
    builder.filter_entry(|entry| {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        !(is_dir && entry.depth() > 0 && is_skipped_dir(entry.path()))
    });

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Failed to read entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if !has_extension(path, extensions) {
            continue;
        }
        match source_file(root, path) {
            Some(file) => files.push(file),
            None => tracing::debug!(path = %path.display(), "Skipping path outside the project root"),
        }
    }

    files.sort_by(|a, b| a.entry_id.cmp(&b.entry_id));
    tracing::debug!(root = %root.display(), files = files.len(), "Scanned project");
    Ok(files)
}

fn source_file(root: &Path, path: &Path) -> Option<SourceFile> {
    let relative = path.strip_prefix(root).ok()?;
    let entry_id = EntryId::new(&relative.to_string_lossy()).ok()?;
    Some(SourceFile::new(entry_id, PathBuf::from(path)))
}
