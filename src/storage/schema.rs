//! Database schema definitions

/// SQL to create the files table
pub const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    hash TEXT NOT NULL
)
"#;

/// SQL to create the occurrences table.
///
/// statement_type: 'd' for definitions, 'u' for usage.
/// identifier_type: 'a' for WP action, 'fi' for WP filter, 'fn' for function,
/// 'g' for global var (reserved), 'c' for class.
pub const CREATE_OCCURRENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS occurrences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    statement_type TEXT NOT NULL,
    identifier_type TEXT NOT NULL,
    name TEXT NOT NULL,
    file_id INTEGER NOT NULL REFERENCES files(id),
    UNIQUE(statement_type, identifier_type, name, file_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_occurrences_file ON occurrences(file_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_FILES_TABLE, CREATE_OCCURRENCES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
