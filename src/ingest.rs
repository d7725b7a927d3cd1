//! Step-driven ingestion - resumable analysis of a WordPress tree
//!
//! A full walk of wp-includes plus every plugin can take longer than a
//! single invocation should, so analysis is partitioned into four
//! ordered, independently-invocable steps:
//!
//! 1. `wp-includes`            (core, definitions only)
//! 2. `wp-admin`               (core, definitions only)
//! 3. `wp-content/plugins` + `wp-content/mu-plugins`
//! 4. `wp-content/themes`
//!
//! Each step flushes its accumulated records before returning, and every
//! flush is an idempotent upsert, so a run is safe to re-invoke from any
//! step. No step reads another step's output; the resolver only runs once
//! all desired steps are in the store.

use crate::storage::SqliteStore;
use crate::visitor::SymbolVisitor;
use crate::walker::{DEFAULT_FILE_SIZE_LIMIT, SourceTreeWalker};
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CORE_TREES: [&str; 2] = ["wp-includes", "wp-admin"];
const EXTENSION_TREES: [(&str, &[&str]); 2] = [
    ("step 3", &["wp-content/plugins", "wp-content/mu-plugins"]),
    ("step 4", &["wp-content/themes"]),
];

/// Options for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// WordPress installation root; all stored paths are relative to it
    pub root: PathBuf,
    pub ignored_dirs: Vec<String>,
    pub file_size_limit: u64,
}

impl IngestOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored_dirs: crate::walker::DEFAULT_IGNORED_DIRS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            file_size_limit: DEFAULT_FILE_SIZE_LIMIT,
        }
    }

    fn walker(&self) -> SourceTreeWalker {
        SourceTreeWalker::new()
            .with_ignored_dirs(self.ignored_dirs.iter().cloned())
            .with_size_limit(self.file_size_limit)
    }
}

/// Counters for one ingestion run
#[derive(Debug, Default, Clone)]
pub struct IngestSummary {
    /// Files parsed and walked
    pub files_scanned: usize,
    /// Files skipped by the pre-filter, a parse failure or an unreadable read
    pub files_skipped: usize,
    /// Occurrence records flushed (including re-flushed duplicates)
    pub records_flushed: usize,
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files scanned, {} skipped, {} records flushed",
            self.files_scanned, self.files_skipped, self.records_flushed
        )
    }
}

/// Run one ingestion step, or all four in order when `step` is `None`.
///
/// A step number outside 1..=4 matches no step and is a no-op; rejecting
/// malformed invocations is the caller's concern.
pub fn run(store: &mut SqliteStore, options: &IngestOptions, step: Option<u8>) -> Result<IngestSummary> {
    let walker = options.walker();
    let mut summary = IngestSummary::default();

    // Core trees are scanned definitions-only so framework-internal calls
    // never count as usage.
    let mut core_visitor = SymbolVisitor::new()?;
    core_visitor.collect_usage = false;
    let mut extension_visitor = SymbolVisitor::new()?;

    for (index, tree) in CORE_TREES.iter().enumerate() {
        let step_number = (index + 1) as u8;
        if step.is_none() || step == Some(step_number) {
            tracing::info!("step {}: scanning {}", step_number, tree);
            scan_tree(&mut core_visitor, &walker, &options.root, tree, &mut summary);
            summary.records_flushed += flush(store, &options.root, &core_visitor)?;
        }
    }

    for (index, (label, trees)) in EXTENSION_TREES.iter().enumerate() {
        let step_number = (index + 3) as u8;
        if step.is_none() || step == Some(step_number) {
            for tree in trees.iter() {
                tracing::info!("{}: scanning {}", label, tree);
                scan_tree(
                    &mut extension_visitor,
                    &walker,
                    &options.root,
                    tree,
                    &mut summary,
                );
            }
            summary.records_flushed += flush(store, &options.root, &extension_visitor)?;
        }
    }

    Ok(summary)
}

fn scan_tree(
    visitor: &mut SymbolVisitor,
    walker: &SourceTreeWalker,
    root: &Path,
    tree: &str,
    summary: &mut IngestSummary,
) {
    for path in walker.walk(&root.join(tree)) {
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!("read skip {}: {}", relative, e);
                summary.files_skipped += 1;
                continue;
            }
        };

        if visitor.scan_source(&relative, &source) {
            summary.files_scanned += 1;
        } else {
            summary.files_skipped += 1;
        }
    }
}

/// Write everything the visitor has accumulated so far. Batches are grouped
/// per (statement, identifier type) and each batch runs in one transaction.
fn flush(store: &mut SqliteStore, root: &Path, visitor: &SymbolVisitor) -> Result<usize> {
    let mut hashes: HashMap<&str, String> = HashMap::new();
    let mut flushed = 0;

    for (statement, identifier, names) in visitor.occurrences.groups() {
        store.begin_transaction()?;
        let result = (|| -> Result<()> {
            for (name, files) in names {
                for file in files {
                    let Some(hash) = file_hash(&mut hashes, root, file) else {
                        continue;
                    };
                    store.upsert_file(file, &hash)?;
                    store.upsert_occurrence(statement, identifier, name, file)?;
                    flushed += 1;
                }
            }
            Ok(())
        })();

        match result {
            Ok(()) => store.commit()?,
            Err(e) => {
                store.rollback()?;
                return Err(e);
            }
        }
    }

    Ok(flushed)
}

/// Content hash of a file, memoized for the duration of one flush. A file
/// that vanished between scan and flush is skipped.
fn file_hash<'a>(
    hashes: &mut HashMap<&'a str, String>,
    root: &Path,
    file: &'a str,
) -> Option<String> {
    if let Some(hash) = hashes.get(file) {
        return Some(hash.clone());
    }
    match std::fs::read(root.join(file)) {
        Ok(bytes) => {
            let hash = blake3::hash(&bytes).to_hex().to_string();
            hashes.insert(file, hash.clone());
            Some(hash)
        }
        Err(e) => {
            tracing::debug!("hash skip {}: {}", file, e);
            None
        }
    }
}
