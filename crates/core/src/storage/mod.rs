//! SQLite storage layer for wikirc

mod documents;
mod journal;
mod migrations;
mod parse;
pub mod query;
mod search;
mod traits;

use crate::error::Result;
use crate::models::{Document, DocumentReference};
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

pub use documents::DocumentTable;
pub use journal::{JournalEntry, JournalStore};
pub use query::{Column, ObjectQuery, QueryLanguage, Row};
pub use search::QueryStore;
pub use traits::{DocumentStore, QueryExecutor};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get document store
    pub fn documents(&self) -> DocumentTable<'_> {
        DocumentTable::new(&self.conn)
    }

    /// Get change journal
    pub fn journal(&self) -> JournalStore<'_> {
        JournalStore::new(&self.conn)
    }

    /// Get object query runner
    pub fn queries(&self) -> QueryStore<'_> {
        QueryStore::new(&self.conn)
    }
}

// Implement collaborator traits for Database
// This enables using Database through the trait interface

impl DocumentStore for Database {
    fn get_document(&self, reference: &DocumentReference) -> Result<Document> {
        self.documents().load(reference)
    }
}

impl QueryExecutor for Database {
    fn execute(&self, query: &ObjectQuery) -> Result<Vec<Row>> {
        self.queries().execute(query)
    }
}
