//! Occurrence records - the atomic fact unit of the analysis
//!
//! Every fact extracted from a PHP file reduces to one record:
//! "this file *defines* or *uses* an identifier of this type with this name".
//! Static methods use the composite name `ClassName::methodName`.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// The kind of identifier an occurrence refers to.
///
/// The serialized form matches the short codes used in the occurrences table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentifierType {
    /// A WordPress action hook name
    #[serde(rename = "a")]
    HookAction,
    /// A WordPress filter hook name
    #[serde(rename = "fi")]
    HookFilter,
    /// A PHP function or static method (`Class::method`)
    #[serde(rename = "fn")]
    Function,
    /// A PHP class name
    #[serde(rename = "c")]
    Class,
    /// Reserved storage code; never emitted by the visitor
    #[serde(rename = "g")]
    GlobalVar,
}

impl IdentifierType {
    /// Short code used as the SQLite encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::HookAction => "a",
            IdentifierType::HookFilter => "fi",
            IdentifierType::Function => "fn",
            IdentifierType::Class => "c",
            IdentifierType::GlobalVar => "g",
        }
    }

    /// Human-readable label for table output
    pub fn label(&self) -> &'static str {
        match self {
            IdentifierType::HookAction => "WP action",
            IdentifierType::HookFilter => "WP filter",
            IdentifierType::Function => "PHP function",
            IdentifierType::Class => "PHP class",
            IdentifierType::GlobalVar => "PHP global",
        }
    }

    /// All identifier types the visitor actually emits
    pub fn all() -> &'static [IdentifierType] {
        &[
            IdentifierType::HookAction,
            IdentifierType::HookFilter,
            IdentifierType::Function,
            IdentifierType::Class,
        ]
    }
}

impl FromStr for IdentifierType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "a" | "action" | "hook-action" => Ok(IdentifierType::HookAction),
            "fi" | "filter" | "hook-filter" => Ok(IdentifierType::HookFilter),
            "fn" | "function" => Ok(IdentifierType::Function),
            "c" | "class" => Ok(IdentifierType::Class),
            "g" | "global" => Ok(IdentifierType::GlobalVar),
            _ => Err(Error::UnknownIdentifierType(s.to_string())),
        }
    }
}

impl std::fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a record describes a definition or a usage of the identifier.
///
/// Hook triggers (`do_action`, `apply_filters`) count as definitions of the
/// extension point; hook registrations (`add_action`, `add_filter`) count as
/// usages of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatementType {
    #[serde(rename = "d")]
    Definition,
    #[serde(rename = "u")]
    Usage,
}

impl StatementType {
    /// Short code used as the SQLite encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Definition => "d",
            StatementType::Usage => "u",
        }
    }
}

impl FromStr for StatementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "d" | "definition" | "def" => Ok(StatementType::Definition),
            "u" | "usage" | "use" => Ok(StatementType::Usage),
            _ => Err(Error::UnknownStatementType(s.to_string())),
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory accumulator for occurrence records.
///
/// An explicit set-valued mapping `(statement, identifier type) → name →
/// set of files`, so re-observing the same fact in the same file is a no-op.
/// The visitor fills one of these per scan batch; ingestion flushes it to the
/// store.
#[derive(Debug, Default, Clone)]
pub struct CollectedOccurrences {
    records: BTreeMap<(StatementType, IdentifierType), BTreeMap<String, BTreeSet<String>>>,
}

impl CollectedOccurrences {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fact. Idempotent per (statement, type, name, file).
    pub fn insert(
        &mut self,
        statement: StatementType,
        identifier: IdentifierType,
        name: &str,
        file: &str,
    ) {
        self.records
            .entry((statement, identifier))
            .or_default()
            .entry(name.to_string())
            .or_default()
            .insert(file.to_string());
    }

    /// Iterate batches grouped by (statement, identifier type)
    pub fn groups(
        &self,
    ) -> impl Iterator<
        Item = (
            StatementType,
            IdentifierType,
            &BTreeMap<String, BTreeSet<String>>,
        ),
    > {
        self.records
            .iter()
            .map(|((statement, identifier), names)| (*statement, *identifier, names))
    }

    /// Files recorded for one (statement, type, name) triple
    pub fn files_for(
        &self,
        statement: StatementType,
        identifier: IdentifierType,
        name: &str,
    ) -> Option<&BTreeSet<String>> {
        self.records
            .get(&(statement, identifier))
            .and_then(|names| names.get(name))
    }

    /// Total number of distinct (statement, type, name, file) records
    pub fn record_count(&self) -> usize {
        self.records
            .values()
            .flat_map(|names| names.values())
            .map(|files| files.len())
            .sum()
    }

    /// Check whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_type_roundtrip() {
        for identifier in IdentifierType::all() {
            let parsed: IdentifierType = identifier.as_str().parse().unwrap();
            assert_eq!(*identifier, parsed);
        }
    }

    #[test]
    fn test_identifier_type_aliases() {
        assert_eq!(
            IdentifierType::from_str("action").unwrap(),
            IdentifierType::HookAction
        );
        assert_eq!(
            IdentifierType::from_str("filter").unwrap(),
            IdentifierType::HookFilter
        );
        assert_eq!(
            IdentifierType::from_str("function").unwrap(),
            IdentifierType::Function
        );
        assert!(IdentifierType::from_str("bogus").is_err());
    }

    #[test]
    fn test_statement_type_codes() {
        assert_eq!(StatementType::Definition.as_str(), "d");
        assert_eq!(StatementType::Usage.as_str(), "u");
        assert_eq!(
            StatementType::from_str("u").unwrap(),
            StatementType::Usage
        );
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut collected = CollectedOccurrences::new();
        collected.insert(
            StatementType::Definition,
            IdentifierType::HookAction,
            "init",
            "wp-content/plugins/a/a.php",
        );
        collected.insert(
            StatementType::Definition,
            IdentifierType::HookAction,
            "init",
            "wp-content/plugins/a/a.php",
        );
        assert_eq!(collected.record_count(), 1);

        collected.insert(
            StatementType::Definition,
            IdentifierType::HookAction,
            "init",
            "wp-content/plugins/a/b.php",
        );
        assert_eq!(collected.record_count(), 2);
    }

    #[test]
    fn test_files_for() {
        let mut collected = CollectedOccurrences::new();
        collected.insert(
            StatementType::Usage,
            IdentifierType::Function,
            "Foo::bar",
            "x.php",
        );

        let files = collected
            .files_for(StatementType::Usage, IdentifierType::Function, "Foo::bar")
            .unwrap();
        assert!(files.contains("x.php"));
        assert!(
            collected
                .files_for(StatementType::Definition, IdentifierType::Function, "Foo::bar")
                .is_none()
        );
    }
}
