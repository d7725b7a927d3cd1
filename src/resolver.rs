//! Dependency resolver - occurrence records → package dependency graph
//!
//! Reads the store, groups definitions and usages by identifier and owning
//! package, and aggregates cross-package edges. Two exclusion rules shape the
//! result:
//! - anything WordPress core also defines is dropped entirely (attributing a
//!   core-shadowed name to one package is unreliable)
//! - a usage is dropped when the identifier is defined by exactly one package
//!   and that package is the user (internal use, not a dependency)

use crate::occurrence::IdentifierType;
use crate::package;
use crate::storage::{OccurrenceRow, SqliteStore};
use crate::Result;
use std::collections::BTreeMap;

/// Hierarchical grouping: identifier type → name → package → files
pub type Grouping = BTreeMap<IdentifierType, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

/// Edge-count graph: consuming package → providing package → count
pub type DependencyGraph = BTreeMap<String, BTreeMap<String, u64>>;

/// Resolves stored occurrence records into package-level dependencies.
///
/// All outputs are recomputed per call and owned by the caller; nothing here
/// is persisted. Empty queries produce empty maps, never errors.
pub struct DependencyResolver<'a> {
    store: &'a SqliteStore,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Package-owned definitions of the requested identifier types, with
    /// core-shadowed names already excluded by the store query.
    pub fn definitions(&self, types: &[IdentifierType]) -> Result<Grouping> {
        let mut grouping = Grouping::new();
        for row in self.store.definition_rows(types)? {
            insert_row(&mut grouping, &row);
        }
        Ok(grouping)
    }

    /// Usages of the requested identifier types, excluding identifiers only
    /// used by the package that defines them.
    pub fn usage(&self, types: &[IdentifierType]) -> Result<Grouping> {
        let definitions = self.definitions(types)?;
        let mut grouping = Grouping::new();

        for row in self.store.usage_rows(types)? {
            let using_package = package::classify(&row.file_path);

            let Some(defining_packages) = definitions
                .get(&row.identifier_type)
                .and_then(|names| names.get(&row.name))
            else {
                continue;
            };

            if defining_packages.len() == 1
                && defining_packages.keys().next() == Some(&using_package)
            {
                continue;
            }

            insert_row(&mut grouping, &row);
        }
        Ok(grouping)
    }

    /// The package → package edge-count graph.
    ///
    /// For each identifier present in both groupings, every (user, definer)
    /// package pair with user ≠ definer contributes one increment; an
    /// identifier defined by several packages fans out one edge per definer.
    pub fn dependencies(&self, types: &[IdentifierType]) -> Result<DependencyGraph> {
        let usage = self.usage(types)?;
        let definitions = self.definitions(types)?;
        let mut graph = DependencyGraph::new();

        for (identifier_type, names) in &usage {
            for (name, using_packages) in names {
                let Some(defining_packages) = definitions
                    .get(identifier_type)
                    .and_then(|names| names.get(name))
                else {
                    continue;
                };

                for using_package in using_packages.keys() {
                    for defining_package in defining_packages.keys() {
                        if using_package == defining_package {
                            continue;
                        }
                        *graph
                            .entry(using_package.clone())
                            .or_default()
                            .entry(defining_package.clone())
                            .or_default() += 1;
                    }
                }
            }
        }
        Ok(graph)
    }
}

fn insert_row(grouping: &mut Grouping, row: &OccurrenceRow) {
    let owning_package = package::classify(&row.file_path);
    let display_path = package::strip_package_prefix(&row.file_path);
    grouping
        .entry(row.identifier_type)
        .or_default()
        .entry(row.name.clone())
        .or_default()
        .entry(owning_package)
        .or_default()
        .push(display_path);
}
