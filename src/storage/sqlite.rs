//! SQLite storage implementation
//!
//! Durable, upsert-only table of occurrence records and file metadata.
//! Re-inserting the same fact is idempotent under the uniqueness constraint
//! on (statement_type, identifier_type, name, file_id).

use super::schema;
use crate::occurrence::{IdentifierType, StatementType};
use crate::{Error, Result};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;

/// File path prefixes owned by the WordPress core framework. Identifiers
/// defined under these prefixes shadow any package-level definition of the
/// same name and drop it from the analysis entirely.
pub const CORE_PATH_PREFIXES: &[&str] = &["wp-includes", "wp-admin"];

/// One row of a resolver query: an occurrence joined to its file path
#[derive(Debug, Clone)]
pub struct OccurrenceRow {
    pub identifier_type: IdentifierType,
    pub name: String,
    pub file_path: String,
}

/// SQLite-backed storage for occurrence records
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Upserts ==========

    /// Insert a file or refresh its content hash
    pub fn upsert_file(&self, path: &str, hash: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO files (path, hash) VALUES (?1, ?2)
            ON CONFLICT(path) DO UPDATE SET hash = excluded.hash
            "#,
            params![path, hash],
        )?;
        Ok(())
    }

    /// Insert an occurrence record; a duplicate of an existing record is a
    /// no-op. The file row must already exist.
    pub fn upsert_occurrence(
        &self,
        statement: StatementType,
        identifier: IdentifierType,
        name: &str,
        file_path: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO occurrences (statement_type, identifier_type, name, file_id)
            VALUES (?1, ?2, ?3, (SELECT id FROM files WHERE path = ?4))
            "#,
            params![statement.as_str(), identifier.as_str(), name, file_path],
        )?;
        Ok(())
    }

    // ========== Resolver queries ==========

    /// Definition rows of the requested identifier types, excluding files
    /// under a core prefix and excluding any (type, name) that core also
    /// defines.
    pub fn definition_rows(&self, types: &[IdentifierType]) -> Result<Vec<OccurrenceRow>> {
        let sql = format!(
            r#"
            SELECT o.identifier_type, o.name, f.path
            FROM occurrences o
            INNER JOIN files f ON (o.file_id = f.id)
            WHERE o.statement_type = 'd'
            AND o.identifier_type IN ({placeholders})
            AND NOT ({file_is_core})
            AND NOT EXISTS (
                SELECT 1
                FROM occurrences cd
                INNER JOIN files cf ON (cd.file_id = cf.id)
                WHERE cd.statement_type = 'd'
                AND cd.identifier_type = o.identifier_type
                AND cd.name = o.name
                AND ({core_file_is_core})
                LIMIT 1
            )
            "#,
            placeholders = placeholders(types.len()),
            file_is_core = core_path_clause("f"),
            core_file_is_core = core_path_clause("cf"),
        );
        self.query_rows(&sql, types)
    }

    /// Usage rows of the requested identifier types for which a definition
    /// exists somewhere and no definition exists under a core prefix.
    pub fn usage_rows(&self, types: &[IdentifierType]) -> Result<Vec<OccurrenceRow>> {
        let sql = format!(
            r#"
            SELECT o.identifier_type, o.name, f.path
            FROM occurrences o
            INNER JOIN files f ON (o.file_id = f.id)
            WHERE o.statement_type = 'u'
            AND o.identifier_type IN ({placeholders})
            AND EXISTS (
                SELECT 1
                FROM occurrences d
                WHERE d.statement_type = 'd'
                AND d.identifier_type = o.identifier_type
                AND d.name = o.name
                LIMIT 1
            )
            AND NOT EXISTS (
                SELECT 1
                FROM occurrences cd
                INNER JOIN files cf ON (cd.file_id = cf.id)
                WHERE cd.statement_type = 'd'
                AND cd.identifier_type = o.identifier_type
                AND cd.name = o.name
                AND ({core_file_is_core})
                LIMIT 1
            )
            "#,
            placeholders = placeholders(types.len()),
            core_file_is_core = core_path_clause("cf"),
        );
        self.query_rows(&sql, types)
    }

    fn query_rows(&self, sql: &str, types: &[IdentifierType]) -> Result<Vec<OccurrenceRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(
                params_from_iter(types.iter().map(IdentifierType::as_str)),
                row_to_occurrence,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========== Bulk operations ==========

    /// Begin a transaction for bulk upserts
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    // ========== Statistics ==========

    /// Count file rows
    pub fn count_files(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count occurrence rows
    pub fn count_occurrences(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM occurrences", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            files: self.count_files()?,
            occurrences: self.count_occurrences()?,
        })
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn core_path_clause(alias: &str) -> String {
    CORE_PATH_PREFIXES
        .iter()
        .map(|prefix| format!("{alias}.path LIKE '{prefix}%'"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn row_to_occurrence(row: &rusqlite::Row) -> rusqlite::Result<OccurrenceRow> {
    let type_str: String = row.get(0)?;
    let identifier_type: IdentifierType = type_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(OccurrenceRow {
        identifier_type,
        name: row.get(1)?,
        file_path: row.get(2)?,
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub files: usize,
    pub occurrences: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Occurrences: {}", self.occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::{IdentifierType as It, StatementType as St};

    fn insert(store: &SqliteStore, statement: St, identifier: It, name: &str, path: &str) {
        store.upsert_file(path, "hash").unwrap();
        store
            .upsert_occurrence(statement, identifier, name, path)
            .unwrap();
    }

    #[test]
    fn test_upserts_are_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();

        insert(&store, St::Definition, It::Function, "foo", "wp-content/plugins/a/a.php");
        insert(&store, St::Definition, It::Function, "foo", "wp-content/plugins/a/a.php");

        assert_eq!(store.count_files().unwrap(), 1);
        assert_eq!(store.count_occurrences().unwrap(), 1);
    }

    #[test]
    fn test_upsert_file_refreshes_hash() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_file("a.php", "h1").unwrap();
        store.upsert_file("a.php", "h2").unwrap();

        let hash: String = store
            .conn
            .query_row("SELECT hash FROM files WHERE path = 'a.php'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(hash, "h2");
        assert_eq!(store.count_files().unwrap(), 1);
    }

    #[test]
    fn test_definition_rows_exclude_core_files() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, St::Definition, It::HookAction, "init", "wp-includes/plugin.php");
        insert(&store, St::Definition, It::HookAction, "shop_ready", "wp-content/plugins/shop/shop.php");

        let rows = store.definition_rows(&[It::HookAction]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "shop_ready");
    }

    #[test]
    fn test_definition_rows_exclude_core_shadowed_names() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, St::Definition, It::Function, "bar", "wp-admin/tools.php");
        insert(&store, St::Definition, It::Function, "bar", "wp-content/plugins/a/a.php");

        let rows = store.definition_rows(&[It::Function]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_usage_rows_require_a_definition() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, St::Usage, It::Function, "undefined_fn", "wp-content/plugins/b/b.php");
        insert(&store, St::Usage, It::Function, "defined_fn", "wp-content/plugins/b/b.php");
        insert(&store, St::Definition, It::Function, "defined_fn", "wp-content/plugins/a/a.php");

        let rows = store.usage_rows(&[It::Function]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "defined_fn");
    }

    #[test]
    fn test_usage_rows_exclude_core_shadowed_names() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, St::Definition, It::Function, "bar", "wp-includes/functions.php");
        insert(&store, St::Definition, It::Function, "bar", "wp-content/plugins/a/a.php");
        insert(&store, St::Usage, It::Function, "bar", "wp-content/plugins/b/b.php");

        let rows = store.usage_rows(&[It::Function]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_queries_filter_by_identifier_type() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, St::Definition, It::HookAction, "evt", "wp-content/plugins/a/a.php");
        insert(&store, St::Definition, It::Class, "Widget", "wp-content/plugins/a/a.php");

        let rows = store.definition_rows(&[It::Class]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identifier_type, It::Class);
    }

    #[test]
    fn test_empty_store_yields_empty_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.definition_rows(It::all()).unwrap().is_empty());
        assert!(store.usage_rows(It::all()).unwrap().is_empty());
    }
}
