//! Source tree walker - filtered enumeration of candidate PHP files
//!
//! Depth-first, directory-listing order. Callers must not depend on ordering
//! for correctness, only for determinism within one run on an unchanged
//! filesystem.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files larger than this are silently skipped
pub const DEFAULT_FILE_SIZE_LIMIT: u64 = 256 * 1024;

/// Directory names never descended into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["vendor", "node_modules", "tests"];

/// Enumerates candidate source files under a root, filtering by extension,
/// size and ignore-list. Hidden entries (leading `.`) are skipped.
pub struct SourceTreeWalker {
    ignored_dirs: BTreeSet<String>,
    size_limit: u64,
}

impl SourceTreeWalker {
    /// Create a walker with the default ignore set and size ceiling
    pub fn new() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
            size_limit: DEFAULT_FILE_SIZE_LIMIT,
        }
    }

    /// Replace the ignored directory-name set
    pub fn with_ignored_dirs(mut self, dirs: impl IntoIterator<Item = String>) -> Self {
        self.ignored_dirs = dirs.into_iter().collect();
        self
    }

    /// Replace the file size ceiling in bytes
    pub fn with_size_limit(mut self, limit: u64) -> Self {
        self.size_limit = limit;
        self
    }

    /// Lazily yield candidate file paths under `root`.
    ///
    /// A nonexistent root yields nothing; it is not an error.
    pub fn walk<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_php_file(entry.path()))
            .filter(|entry| {
                entry
                    .metadata()
                    .map(|meta| meta.len() <= self.size_limit)
                    .unwrap_or(false)
            })
            .map(DirEntry::into_path)
    }

    // The root entry itself is always kept, even if its own name is hidden
    // or ignored; the filters only apply below the root.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.ignored_dirs.contains(name.as_ref())
    }
}

impl Default for SourceTreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

fn is_php_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("php"))
        .unwrap_or(false)
}
