//! Document change events

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::models::Document;

/// The three document mutations the bot reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(ChangeKind::Created),
            "updated" => Some(ChangeKind::Updated),
            "deleted" => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered alongside an event
#[derive(Debug, Clone)]
pub enum EventSource {
    Document(Document),
    /// Anything the bus carries that is not a document (type name for logs)
    Other(String),
}

impl EventSource {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            EventSource::Document(doc) => Some(doc),
            EventSource::Other(_) => None,
        }
    }
}

/// A change decided once at ingestion, consumed once by the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub document_id: String,
    pub author: String,
    pub comment: String,
    /// Plain view URL of the document
    pub external_url: String,
    /// New revision, only for updates
    pub diff_revision: Option<String>,
}

impl ChangeEvent {
    pub fn from_document(
        kind: ChangeKind,
        document: &Document,
        context: &ExecutionContext,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            document_id: document.reference.local(),
            author: document.author.clone(),
            comment: document.comment.clone(),
            external_url: document.external_url("view", None, context)?,
            diff_revision: match kind {
                ChangeKind::Updated => Some(document.version.clone()),
                ChangeKind::Created | ChangeKind::Deleted => None,
            },
        })
    }
}
