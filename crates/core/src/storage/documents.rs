//! Document storage operations

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, instrument};

use super::journal::JournalStore;
use super::parse::{next_version, parse_properties, OptionalExt};
use crate::error::Result;
use crate::models::{ChangeKind, Document, DocumentReference, XObject};

pub struct DocumentTable<'a> {
    conn: &'a Connection,
}

impl<'a> DocumentTable<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find a document with its objects
    #[instrument(skip_all, fields(document = %reference))]
    pub fn find(&self, reference: &DocumentReference) -> Result<Option<Document>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, author, comment, version, content FROM documents
                 WHERE wiki = ?1 AND space = ?2 AND name = ?3",
                params![reference.wiki, reference.space, reference.name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        Document {
                            reference: reference.clone(),
                            author: row.get(1)?,
                            comment: row.get(2)?,
                            version: row.get(3)?,
                            content: row.get(4)?,
                            objects: Vec::new(),
                        },
                    ))
                },
            )
            .optional()?;

        let Some((id, mut document)) = row else {
            return Ok(None);
        };

        document.objects = self.objects_for(id)?;
        Ok(Some(document))
    }

    /// Load a document, or a blank one at that location when it does not exist
    pub fn load(&self, reference: &DocumentReference) -> Result<Document> {
        Ok(self
            .find(reference)?
            .unwrap_or_else(|| Document::new(reference.clone())))
    }

    /// Save a document on behalf of `actor`, bumping its version and
    /// journaling the change. Returns the stored document.
    #[instrument(skip_all, fields(document = %document.reference, actor = %actor))]
    pub fn save(&self, document: &Document, comment: &str, actor: &str) -> Result<Document> {
        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, version FROM documents WHERE wiki = ?1 AND space = ?2 AND name = ?3",
                params![
                    document.reference.wiki,
                    document.reference.space,
                    document.reference.name
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let mut stored = document.clone();
        stored.author = actor.to_string();
        stored.comment = comment.to_string();

        let (id, kind) = match existing {
            Some((id, version)) => {
                stored.version = next_version(&version);
                tx.execute(
                    "UPDATE documents SET author = ?2, comment = ?3, version = ?4, content = ?5,
                     updated_at = ?6 WHERE id = ?1",
                    params![
                        id,
                        stored.author,
                        stored.comment,
                        stored.version,
                        stored.content,
                        Utc::now().to_rfc3339()
                    ],
                )?;
                tx.execute("DELETE FROM objects WHERE document_id = ?1", params![id])?;
                (id, ChangeKind::Updated)
            }
            None => {
                stored.version = "1.1".to_string();
                tx.execute(
                    "INSERT INTO documents (wiki, space, name, author, comment, version, content, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        stored.reference.wiki,
                        stored.reference.space,
                        stored.reference.name,
                        stored.author,
                        stored.comment,
                        stored.version,
                        stored.content,
                        Utc::now().to_rfc3339()
                    ],
                )?;
                (tx.last_insert_rowid(), ChangeKind::Created)
            }
        };

        for object in &stored.objects {
            tx.execute(
                "INSERT INTO objects (document_id, class, number, properties) VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    object.class,
                    object.number,
                    serde_json::to_string(&object.properties)?
                ],
            )?;
        }

        JournalStore::new(&tx).append(kind, &stored, actor)?;
        tx.commit()?;

        debug!(kind = %kind, version = %stored.version, "Saved document");
        Ok(stored)
    }

    /// Delete a document on behalf of `actor`. Returns false if it did not exist.
    #[instrument(skip_all, fields(document = %reference, actor = %actor))]
    pub fn delete(&self, reference: &DocumentReference, actor: &str) -> Result<bool> {
        let Some(document) = self.find(reference)? else {
            return Ok(false);
        };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM documents WHERE wiki = ?1 AND space = ?2 AND name = ?3",
            params![reference.wiki, reference.space, reference.name],
        )?;
        JournalStore::new(&tx).append(ChangeKind::Deleted, &document, actor)?;
        tx.commit()?;

        debug!("Deleted document");
        Ok(true)
    }

    fn objects_for(&self, document_id: i64) -> Result<Vec<XObject>> {
        let mut stmt = self.conn.prepare(
            "SELECT class, number, properties FROM objects
             WHERE document_id = ?1 ORDER BY class, number",
        )?;

        let rows = stmt.query_map(params![document_id], |row| {
            Ok(XObject {
                class: row.get(0)?,
                number: row.get(1)?,
                properties: parse_properties(&row.get::<_, String>(2)?)?,
            })
        })?;

        let mut objects = Vec::new();
        for row in rows {
            objects.push(row?);
        }
        Ok(objects)
    }
}
