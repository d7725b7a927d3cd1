//! Storage module - SQLite persistence for occurrence records

pub mod schema;
pub mod sqlite;

pub use sqlite::{OccurrenceRow, SqliteStore, StoreStats};
