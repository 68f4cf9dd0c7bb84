//! Schema migrations
//!
//! Applied in version order; each one runs in its own transaction together
//! with its `schema_migrations` row.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use crate::error::Result;

pub struct Migration {
    /// Sequential, starting from 1
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Documents and objects",
        sql: r#"
            -- Documents table
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wiki TEXT NOT NULL,
                space TEXT NOT NULL,
                name TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT '',
                comment TEXT NOT NULL DEFAULT '',
                version TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                updated_at TEXT NOT NULL,
                UNIQUE(wiki, space, name)
            );

            -- Objects table (typed records attached to documents)
            CREATE TABLE IF NOT EXISTS objects (
                document_id INTEGER NOT NULL,
                class TEXT NOT NULL,
                number INTEGER NOT NULL,
                properties TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (document_id, class, number),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for object queries",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_objects_class ON objects(class);
            CREATE INDEX IF NOT EXISTS idx_documents_wiki ON documents(wiki);
        "#,
    },
    Migration {
        version: 3,
        description: "Add document change journal",
        sql: r#"
            -- One row per document mutation, read by the change feed
            CREATE TABLE IF NOT EXISTS document_events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                wiki TEXT NOT NULL,
                space TEXT NOT NULL,
                name TEXT NOT NULL,
                actor TEXT NOT NULL,
                snapshot TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );
        "#,
    },
];

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Highest applied version, 0 on a fresh database
fn applied_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// Apply one migration and record it atomically
fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.description, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Bring the schema up to date
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    ensure_migrations_table(conn)?;

    let from = applied_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        apply(conn, migration)?;
    }

    info!(from, to = applied_version(conn)?, "Database schema updated");
    Ok(())
}
