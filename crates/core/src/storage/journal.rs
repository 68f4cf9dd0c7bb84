//! Document change journal
//!
//! Every save and delete appends one row holding a snapshot of the document
//! as it was at that moment. Deleted documents can no longer be loaded, so
//! the snapshot is the only source for their metadata.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::parse::{parse_datetime, parse_kind, parse_snapshot};
use crate::error::Result;
use crate::models::{ChangeKind, Document};

/// A journaled mutation
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub seq: i64,
    pub kind: ChangeKind,
    /// User who performed the change
    pub actor: String,
    pub document: Document,
    pub occurred_at: DateTime<Utc>,
}

pub struct JournalStore<'a> {
    conn: &'a Connection,
}

impl<'a> JournalStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a change
    pub fn append(&self, kind: ChangeKind, document: &Document, actor: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO document_events (kind, wiki, space, name, actor, snapshot, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                kind.as_str(),
                document.reference.wiki,
                document.reference.space,
                document.reference.name,
                actor,
                serde_json::to_string(document)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Entries with `seq > after`, oldest first
    pub fn after(&self, after: i64, limit: u32) -> Result<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, kind, actor, snapshot, occurred_at FROM document_events
             WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![after, limit], |row| {
            Ok(JournalEntry {
                seq: row.get(0)?,
                kind: parse_kind(&row.get::<_, String>(1)?)?,
                actor: row.get(2)?,
                document: parse_snapshot(&row.get::<_, String>(3)?)?,
                occurred_at: parse_datetime(&row.get::<_, String>(4)?)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Highest sequence number, 0 when empty
    pub fn latest_seq(&self) -> Result<i64> {
        let seq: Option<i64> =
            self.conn
                .query_row("SELECT MAX(seq) FROM document_events", [], |row| row.get(0))?;
        Ok(seq.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentReference;
    use crate::storage::Database;

    #[test]
    fn test_empty_journal() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.journal().latest_seq().unwrap(), 0);
        assert!(db.journal().after(0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_after_respects_cursor_and_limit() {
        let db = Database::open_in_memory().unwrap();
        let journal = db.journal();
        let doc = Document::new(DocumentReference::new("xwiki", "Main", "WebHome"));

        let first = journal.append(ChangeKind::Created, &doc, "XWiki.alice").unwrap();
        journal.append(ChangeKind::Updated, &doc, "XWiki.alice").unwrap();
        journal.append(ChangeKind::Deleted, &doc, "XWiki.bob").unwrap();

        let page = journal.after(first, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].kind, ChangeKind::Updated);

        let last = journal.after(0, 10).unwrap().pop().unwrap();
        assert_eq!(last.kind, ChangeKind::Deleted);
        assert_eq!(last.actor, "XWiki.bob");
        assert_eq!(journal.latest_seq().unwrap(), last.seq);
    }
}
