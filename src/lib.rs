//! # Depvis - WordPress dependency analyzer
//!
//! Statically discovers cross-package coupling in a WordPress installation.
//!
//! Depvis provides:
//! - A single-pass tree-sitter visitor that records, per PHP file, which
//!   hook triggers/registrations, functions, classes and static methods the
//!   file defines versus uses
//! - SQLite-backed storage of occurrence records with idempotent upserts
//! - A resolver that turns stored records into a plugin/theme dependency
//!   graph, excluding everything shadowed by WordPress core
//! - Step-driven ingestion so a large tree can be analyzed in resumable parts

pub mod occurrence;
pub mod package;
pub mod walker;
pub mod visitor;
pub mod storage;
pub mod resolver;
pub mod ingest;
pub mod output;
pub mod config;

// Re-exports for convenient access
pub use occurrence::{CollectedOccurrences, IdentifierType, StatementType};
pub use resolver::{DependencyGraph, DependencyResolver, Grouping};
pub use storage::SqliteStore;
pub use visitor::SymbolVisitor;
pub use walker::SourceTreeWalker;

/// Result type alias for Depvis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Depvis operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown identifier type: {0}")]
    UnknownIdentifierType(String),

    #[error("Unknown statement type: {0}")]
    UnknownStatementType(String),
}
