//! Source file discovery using the ignore crate (same as ripgrep).

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::error::{ChunkerError, Result};
use crate::language::Language;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "coverage",
    "test",
    "__tests__",
];

/// File name fragments marking tests, declarations and tool config.
const SKIPPED_FILE_PATTERNS: &[&str] = &[
    ".test.",
    ".spec.",
    "_test.go",
    ".d.ts",
    ".config.js",
];

pub fn should_skip_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

pub fn should_skip_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_lowercase();
    SKIPPED_FILE_PATTERNS
        .iter()
        .any(|pattern| name.contains(pattern))
}

/// Every chunkable source file under `root`, sorted by path.
///
/// Hidden files are walked; `.gitignore` rules apply inside git checkouts.
/// Unreadable entries are logged and skipped.
pub fn source_files(root: &Path) -> Result<Vec<PathBuf>> {
    std::fs::metadata(root).map_err(|source| ChunkerError::Read {
        path: root.to_path_buf(),
        source,
    })?;

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let skipped = is_dir
                && entry.depth() > 0
                && entry.file_name().to_str().is_some_and(should_skip_dir);
            if skipped {
                debug!("Skipping directory {}", entry.path().display());
            }
            !skipped
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.into_path();
        if Language::from_path(&path).is_none() {
            continue;
        }
        if should_skip_file(&path) {
            debug!("Skipping {}", path.display());
            continue;
        }
        files.push(path);
    }
    Ok(files)
}
